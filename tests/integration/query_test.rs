//! Statement execution integration tests.
//!
//! Tests implicit commit, error translation and statement release.

use super::common::open;
use pretty_assertions::assert_eq;
use sqlany_adapter::db::{MockDriver, RawValue, Value};
use sqlany_adapter::query::IDENTITY_QUERY;
use sqlany_adapter::AdapterError;

#[test]
fn test_execute_dui_returns_affected_rows_and_commits() {
    let db = open(MockDriver::new().with_affected("DELETE FROM orders WHERE shipped = 1", 4));

    assert_eq!(db.execute_dui("DELETE FROM orders WHERE shipped = 1").unwrap(), 4);

    let log = db.driver().log();
    assert_eq!(log.commits, 1);
    assert_eq!(log.statements_freed, log.statements_opened);
}

#[test]
fn test_each_statement_commits_before_the_next() {
    let db = open(MockDriver::new());
    for sql in ["UPDATE a SET x = 1", "UPDATE b SET y = 2", "UPDATE c SET z = 3"] {
        db.execute_dui(sql).unwrap();
    }
    assert_eq!(db.driver().log().commits, 3);
}

#[test]
fn test_null_result_becomes_database_error() {
    let sql = "INSERT INTO customers (id) VALUES (1)";
    let db = open(MockDriver::new().with_error(
        sql,
        -193,
        "Primary key for table 'customers' is not unique",
    ));

    let err = db.execute_dui(sql).unwrap_err();
    match err {
        AdapterError::Database {
            message,
            errno,
            sql: failed_sql,
        } => {
            assert_eq!(message, "Primary key for table 'customers' is not unique");
            assert_eq!(errno, -193);
            assert_eq!(failed_sql, sql);
        }
        other => panic!("Expected Database error, got {:?}", other),
    }

    let log = db.driver().log();
    assert_eq!(log.commits, 0);
    assert!(log.statements_opened.is_empty());
}

#[test]
fn test_execute_insert_returns_identity() {
    let db = open(
        MockDriver::new()
            .with_affected("INSERT INTO t(a) VALUES (1)", 1)
            .with_rows(IDENTITY_QUERY, &[("@@identity", 484)], vec![vec![RawValue::Int(17)]]),
    );

    assert_eq!(
        db.execute_insert("INSERT INTO t(a) VALUES (1)").unwrap(),
        Some(Value::Int(17))
    );
    let log = db.driver().log();
    assert_eq!(log.executed.last().map(String::as_str), Some(IDENTITY_QUERY));
    assert_eq!(log.statements_freed.len(), 2);
}

#[test]
fn test_execute_insert_without_identity_row() {
    let db = open(
        MockDriver::new()
            .with_affected("INSERT INTO log(msg) VALUES ('x')", 1)
            .with_rows(IDENTITY_QUERY, &[("@@identity", 484)], vec![]),
    );

    assert_eq!(db.execute_insert("INSERT INTO log(msg) VALUES ('x')").unwrap(), None);
}

#[test]
fn test_failed_insert_skips_identity_query() {
    let sql = "INSERT INTO t(a) VALUES ('oops')";
    let db = open(MockDriver::new().with_error(sql, -157, "Cannot convert 'oops' to a int"));

    assert_eq!(db.execute_insert(sql).unwrap_err().errno(), Some(-157));
    assert_eq!(db.driver().log().executed, vec![sql.to_string()]);
}

#[test]
fn test_execute_with_result_callback() {
    let db = open(MockDriver::new().with_rows(
        "SELECT name FROM sys.systable",
        &[("name", 448)],
        vec![vec![RawValue::Text("SYSTABLE".into())]],
    ));

    let first = db
        .execute("SELECT name FROM sys.systable", |result| {
            assert_eq!(result.num_columns(), 1);
            assert!(result.fetch_next());
            result.get(0)
        })
        .unwrap();

    assert_eq!(first, RawValue::Text("SYSTABLE".into()));
    assert_eq!(db.driver().log().commits, 1);
}

#[test]
fn test_result_callback_error_propagates_after_release() {
    let db = open(MockDriver::new().with_rows("SELECT 1", &[("col0", 496)], vec![vec![
        RawValue::Int(1),
    ]]));

    let err = db
        .execute("SELECT 1", |_| -> sqlany_adapter::Result<()> {
            Err(AdapterError::conversion("consumer rejected row"))
        })
        .unwrap_err();

    assert_eq!(err, AdapterError::conversion("consumer rejected row"));
    let log = db.driver().log();
    assert_eq!(log.statements_freed, log.statements_opened);
    assert_eq!(log.commits, 0);
}

#[test]
fn test_free_failure_does_not_mask_result() {
    let db = open(
        MockDriver::new()
            .with_affected("UPDATE t SET a = 1", 5)
            .with_failing_free_statement(),
    );
    assert_eq!(db.execute_dui("UPDATE t SET a = 1").unwrap(), 5);
    assert_eq!(db.driver().log().statements_freed.len(), 1);
}
