//! Integration tests for the adapter.

pub mod common;
pub mod connection_test;
pub mod query_test;
pub mod transaction_test;
