//! Statement execution with implicit commit.
//!
//! Every statement runs through the driver's execute-direct primitive. Outside
//! an explicit transaction a successful statement is committed before control
//! returns; the statement handle is released on every exit path.

use std::time::Instant;

use tracing::{debug, warn};

use crate::connection::Connection;
use crate::db::{ColumnDescriptor, NativeDriver, RawValue, Value};
use crate::error::{AdapterError, Result};

/// Query used to read the identity generated by the last insert.
pub const IDENTITY_QUERY: &str = "SELECT @@IDENTITY";

/// An open statement handle and its cursor.
///
/// Frees the handle exactly once when dropped, whether the consumer finished,
/// failed, or never looked at it.
pub struct ResultSet<'a, D: NativeDriver> {
    driver: &'a D,
    conn: &'a D::Connection,
    sql: &'a str,
    stmt: Option<D::Statement>,
}

impl<'a, D: NativeDriver> ResultSet<'a, D> {
    fn new(driver: &'a D, conn: &'a D::Connection, sql: &'a str, stmt: D::Statement) -> Self {
        Self {
            driver,
            conn,
            sql,
            stmt: Some(stmt),
        }
    }

    /// Statement text that produced this result.
    pub fn sql(&self) -> &str {
        self.sql
    }

    fn driver_error(&self) -> AdapterError {
        let (errno, message) = self.driver.error(self.conn);
        AdapterError::database(message, errno, self.sql)
    }

    /// Number of result columns. Zero when the statement returned no rows.
    pub fn num_columns(&self) -> usize {
        self.stmt
            .as_ref()
            .map(|stmt| self.driver.num_columns(stmt))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }

    pub fn column(&self, index: usize) -> Result<ColumnDescriptor> {
        self.stmt
            .as_ref()
            .and_then(|stmt| self.driver.column_info(stmt, index))
            .ok_or_else(|| self.driver_error())
    }

    /// Metadata for every column, in ordinal order.
    pub fn columns(&self) -> Result<Vec<ColumnDescriptor>> {
        (0..self.num_columns()).map(|i| self.column(i)).collect()
    }

    /// Advances the cursor; false once rows are exhausted.
    pub fn fetch_next(&mut self) -> bool {
        match self.stmt.as_mut() {
            Some(stmt) => self.driver.fetch_next(stmt),
            None => false,
        }
    }

    /// Raw value of column `index` at the current row.
    pub fn get(&self, index: usize) -> Result<RawValue> {
        self.stmt
            .as_ref()
            .and_then(|stmt| self.driver.get_column(stmt, index))
            .ok_or_else(|| self.driver_error())
    }

    pub fn affected_rows(&self) -> i64 {
        self.stmt
            .as_ref()
            .map(|stmt| self.driver.affected_rows(stmt))
            .unwrap_or(0)
    }
}

impl<D: NativeDriver> Drop for ResultSet<'_, D> {
    fn drop(&mut self) {
        if let Some(stmt) = self.stmt.take() {
            if !self.driver.free_statement(stmt) {
                warn!("Failed to free statement handle for: {}", self.sql);
            }
        }
    }
}

/// Runs statements on one exclusively held connection.
pub struct StatementExecutor<'c, D: NativeDriver> {
    driver: &'c D,
    conn: &'c mut Connection<D>,
}

impl<'c, D: NativeDriver> StatementExecutor<'c, D> {
    pub fn new(driver: &'c D, conn: &'c mut Connection<D>) -> Self {
        Self { driver, conn }
    }

    /// Whether an explicit transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.conn.in_transaction()
    }

    fn driver_error(&self, sql: &str) -> AdapterError {
        let (errno, message) = self.driver.error(self.conn.handle());
        AdapterError::database(message, errno, sql)
    }

    /// Executes `sql` and hands the open result to `on_result`.
    ///
    /// The statement is committed afterwards unless a transaction is open. If
    /// `on_result` fails, its error is returned unchanged and nothing is
    /// committed. The statement handle is released in every case.
    pub fn execute<T>(
        &mut self,
        sql: &str,
        on_result: impl FnOnce(&mut ResultSet<'_, D>) -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let stmt = self.driver.execute_direct(self.conn.handle_mut(), sql);
        debug!("({:.6}s) {}", start.elapsed().as_secs_f64(), sql);

        let Some(stmt) = stmt else {
            let err = self.driver_error(sql);
            warn!("{}: {}", err.category(), err);
            return Err(err);
        };

        let value = {
            let mut result = ResultSet::new(self.driver, self.conn.handle(), sql, stmt);
            on_result(&mut result)?
        };

        self.commit_unless_in_transaction(sql)?;
        Ok(value)
    }

    /// Executes a statement and returns the affected row count.
    pub fn execute_dui(&mut self, sql: &str) -> Result<i64> {
        self.execute(sql, |result| Ok(result.affected_rows()))
    }

    /// Executes an insert and returns the identity value it generated.
    pub fn execute_insert(&mut self, sql: &str) -> Result<Option<Value>> {
        self.execute(sql, |_| Ok(()))?;
        self.last_insert_id()
    }

    /// Most recent identity value generated in this session, if any.
    pub fn last_insert_id(&mut self) -> Result<Option<Value>> {
        self.execute(IDENTITY_QUERY, |result| {
            if result.fetch_next() {
                Ok(Some(Value::from(result.get(0)?)))
            } else {
                Ok(None)
            }
        })
    }

    /// Runs `f` inside an explicit transaction.
    ///
    /// Commits when `f` succeeds and rolls back when it fails. A nested call
    /// joins the transaction that is already open.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.conn.in_transaction() {
            return f(self);
        }

        debug!("BEGIN TRANSACTION");
        self.conn.set_in_transaction(true);
        let result = f(self);
        self.conn.set_in_transaction(false);

        match result {
            Ok(value) => {
                self.commit("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                debug!("ROLLBACK");
                if !self.driver.rollback(self.conn.handle_mut()) {
                    let (errno, message) = self.driver.error(self.conn.handle());
                    warn!("Rollback failed: {message} ({errno})");
                }
                Err(e)
            }
        }
    }

    fn commit_unless_in_transaction(&mut self, sql: &str) -> Result<()> {
        if self.conn.in_transaction() {
            return Ok(());
        }
        self.commit(sql)
    }

    fn commit(&mut self, sql: &str) -> Result<()> {
        if self.driver.commit(self.conn.handle_mut()) {
            Ok(())
        } else {
            Err(self.driver_error(sql))
        }
    }
}
