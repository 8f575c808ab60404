//! SQL Anywhere adapter core.
//!
//! Turns raw result sets from the native client interface into typed rows,
//! runs statements with implicit commit outside explicit transactions, and
//! manages the lifecycle of the native connection.

pub mod config;
pub mod connection;
pub mod database;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;

pub use database::{Database, Dataset};
pub use error::{AdapterError, Result};
