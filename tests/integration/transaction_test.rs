//! Transaction integration tests.
//!
//! Tests that commit is deferred to the transaction boundary.

use super::common::open;
use pretty_assertions::assert_eq;
use sqlany_adapter::db::{MockDriver, RawValue, Value};
use sqlany_adapter::AdapterError;

#[test]
fn test_no_commit_until_transaction_closes() {
    let db = open(
        MockDriver::new()
            .with_affected("UPDATE accounts SET balance = balance - 10 WHERE id = 1", 1)
            .with_affected("UPDATE accounts SET balance = balance + 10 WHERE id = 2", 1),
    );

    db.transaction(|tx| {
        tx.execute_dui("UPDATE accounts SET balance = balance - 10 WHERE id = 1")?;
        tx.execute_dui("UPDATE accounts SET balance = balance + 10 WHERE id = 2")?;
        assert_eq!(db.driver().log().commits, 0);
        Ok(())
    })
    .unwrap();

    let log = db.driver().log();
    assert_eq!(log.commits, 1);
    assert_eq!(log.rollbacks, 0);
    assert_eq!(log.statements_freed.len(), 2);
}

#[test]
fn test_error_rolls_back_and_propagates() {
    let failing = "UPDATE accounts SET balance = 'x' WHERE id = 2";
    let db = open(
        MockDriver::new()
            .with_affected("UPDATE accounts SET balance = 0 WHERE id = 1", 1)
            .with_error(failing, -157, "Cannot convert 'x' to a numeric"),
    );

    let err = db
        .transaction(|tx| {
            tx.execute_dui("UPDATE accounts SET balance = 0 WHERE id = 1")?;
            tx.execute_dui(failing)
        })
        .unwrap_err();

    assert_eq!(err.sql(), Some(failing));
    let log = db.driver().log();
    assert_eq!(log.commits, 0);
    assert_eq!(log.rollbacks, 1);
}

#[test]
fn test_statements_after_transaction_commit_again() {
    let db = open(MockDriver::new());

    db.transaction(|tx| tx.execute_dui("UPDATE a SET x = 1")).unwrap();
    db.execute_dui("UPDATE a SET x = 2").unwrap();

    assert_eq!(db.driver().log().commits, 2);
}

#[test]
fn test_fetch_inside_transaction() {
    let db = open(
        MockDriver::new()
            .with_affected("INSERT INTO t(a) VALUES (1)", 1)
            .with_rows("SELECT a FROM t", &[("a", 496)], vec![vec![RawValue::Int(1)]]),
    );
    let dataset = db.dataset();

    let rows = db
        .transaction(|tx| {
            tx.execute_dui("INSERT INTO t(a) VALUES (1)")?;
            let mut rows = Vec::new();
            dataset.fetch_rows_with(tx, "SELECT a FROM t", |row| {
                rows.push(row);
                Ok(())
            })?;
            Ok(rows)
        })
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("a"), Some(&Value::Int(1)));
    assert_eq!(db.driver().log().commits, 1);
}

#[test]
fn test_row_callback_error_inside_transaction_rolls_back() {
    let db = open(MockDriver::new().with_rows("SELECT a FROM t", &[("a", 496)], vec![
        vec![RawValue::Int(1)],
        vec![RawValue::Int(2)],
    ]));
    let dataset = db.dataset();

    let err = db
        .transaction(|tx| {
            dataset.fetch_rows_with(tx, "SELECT a FROM t", |_| {
                Err(AdapterError::internal("abort"))
            })
        })
        .unwrap_err();

    assert_eq!(err, AdapterError::internal("abort"));
    let log = db.driver().log();
    assert_eq!(log.rollbacks, 1);
    assert_eq!(log.statements_freed, log.statements_opened);
}

#[test]
fn test_database_call_inside_transaction_fails_fast() {
    let db = open(MockDriver::new().with_rows("SELECT a FROM t", &[("a", 496)], vec![]));

    let err = db
        .transaction(|_| db.execute_dui("UPDATE a SET x = 1"))
        .unwrap_err();
    assert!(matches!(err, AdapterError::Internal(_)));
    assert!(err.to_string().contains("already held by this thread"));

    let err = db
        .transaction(|_| db.dataset().all("SELECT a FROM t").map(|_| ()))
        .unwrap_err();
    assert!(matches!(err, AdapterError::Internal(_)));

    let log = db.driver().log();
    assert_eq!(log.rollbacks, 2);
    assert!(log.executed.is_empty());

    // The connection is usable again once the transaction has ended.
    assert_eq!(db.execute_dui("UPDATE a SET x = 1").unwrap(), 0);
}
