//! Connection management.
//!
//! Centralizes native session lifecycle and exclusive access to it.

pub mod manager;

pub use manager::{Connection, ConnectionManager, DISABLE_TIMEZONE_ADJUSTMENT};
