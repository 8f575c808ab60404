//! Shared helpers for integration tests.

use sqlany_adapter::config::{AdapterOptions, ConnectionConfig};
use sqlany_adapter::db::{ApplicationTimezone, MockDriver};
use sqlany_adapter::Database;

/// Structured config for the `demo` database.
pub fn demo_config() -> ConnectionConfig {
    ConnectionConfig {
        server: Some("demo17".to_string()),
        database: Some("demo".to_string()),
        user: Some("dba".to_string()),
        password: Some("sql".to_string()),
        ..Default::default()
    }
}

/// Opens a database over `driver` with default adapter options.
pub fn open(driver: MockDriver) -> Database<MockDriver> {
    Database::new(driver, demo_config(), AdapterOptions::default()).unwrap()
}

/// Opens a database over `driver` running in UTC.
pub fn open_utc(driver: MockDriver) -> Database<MockDriver> {
    let options = AdapterOptions {
        application_timezone: ApplicationTimezone::Utc,
        ..Default::default()
    };
    Database::new(driver, demo_config(), options).unwrap()
}
