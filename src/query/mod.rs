//! Statement execution and row materialization.

pub mod executor;
pub mod materializer;

pub use executor::{ResultSet, StatementExecutor, IDENTITY_QUERY};
pub use materializer::{fetch_rows, FetchOptions, IdentifierCase};
