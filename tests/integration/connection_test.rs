//! Connection integration tests.
//!
//! Tests connection string construction, connect failures and disconnect.

use super::common::{demo_config, open, open_utc};
use pretty_assertions::assert_eq;
use sqlany_adapter::config::{AdapterOptions, Config, ConnectionConfig};
use sqlany_adapter::connection::DISABLE_TIMEZONE_ADJUSTMENT;
use sqlany_adapter::db::MockDriver;
use sqlany_adapter::{AdapterError, Database};

#[test]
fn test_first_statement_connects_with_structured_string() {
    let db = open(MockDriver::new());
    db.execute_dui("UPDATE t SET a = 1").unwrap();

    let log = db.driver().log();
    assert_eq!(
        log.connect_strings,
        vec!["ServerName=demo17;DatabaseName=demo;UserID=dba;Password=sql;Idle=0".to_string()]
    );
    assert!(log.immediate.is_empty());
}

#[test]
fn test_uri_connection_string() {
    let config = ConnectionConfig::from_uri(
        "sqlanywhere://db.example.com/var/data/sales.db?ServerName=sales;UID=report;PWD=pw",
    )
    .unwrap();
    let db = Database::new(MockDriver::new(), config, AdapterOptions::default()).unwrap();
    db.execute_dui("SELECT 1").unwrap();

    assert_eq!(
        db.driver().log().connect_strings,
        vec!["DBN=sales.db;ServerName=sales;UID=report;PWD=pw".to_string()]
    );
}

#[test]
fn test_utc_session_disables_timezone_adjustment_once() {
    let db = open_utc(MockDriver::new());
    db.execute_dui("UPDATE t SET a = 1").unwrap();
    db.execute_dui("UPDATE t SET a = 2").unwrap();

    assert_eq!(
        db.driver().log().immediate,
        vec![DISABLE_TIMEZONE_ADJUSTMENT.to_string()]
    );
}

#[test]
fn test_failed_connect_prevents_execution() {
    let db = open(MockDriver::new().with_connect_failure(-100, "Database server not found"));
    let err = db.execute_dui("UPDATE t SET a = 1").unwrap_err();

    assert!(matches!(err, AdapterError::Connection(_)));
    assert!(err.to_string().contains("Database server not found"));
    let log = db.driver().log();
    assert!(log.executed.is_empty());
    assert_eq!(log.freed_connections, 1);
    assert!(!db.is_connected());
}

#[test]
fn test_disconnect_then_reconnect() {
    let db = open(MockDriver::new());
    db.execute_dui("SELECT 1").unwrap();
    assert!(db.is_connected());

    db.disconnect().unwrap();
    assert!(!db.is_connected());

    db.execute_dui("SELECT 1").unwrap();
    let log = db.driver().log();
    assert_eq!(log.disconnects, 1);
    assert_eq!(log.connect_strings.len(), 2);
}

#[test]
fn test_conflicting_config_rejected_up_front() {
    let mut config = demo_config();
    config.uri = Some("sqlanywhere://h/demo".to_string());
    let err = Database::new(MockDriver::new(), config, AdapterOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, AdapterError::Config(_)));
}

#[test]
fn test_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[adapter]
application_timezone = "utc"

[connections.default]
database = "demo"
commlinks = "shmem"
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    let db = Database::from_config(MockDriver::new(), &config, None).unwrap();
    db.execute_dui("SELECT 1").unwrap();

    let log = db.driver().log();
    assert_eq!(
        log.connect_strings,
        vec!["ServerName=demo;DatabaseName=demo;UserID=dba;Password=sql;CommLinks=shmem;Idle=0"
            .to_string()]
    );
    assert_eq!(log.immediate, vec![DISABLE_TIMEZONE_ADJUSTMENT.to_string()]);
}
