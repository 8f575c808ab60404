//! Mock native driver for testing.
//!
//! Scripted responses keyed by SQL text, plus a call log recording commits,
//! rollbacks and statement handle traffic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::driver::{NativeDriver, CONNECT_SUCCESS};
use super::types::{ColumnDescriptor, RawValue};

/// Scripted outcome of executing one statement.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A result set with the given columns and rows.
    Rows {
        columns: Vec<ColumnDescriptor>,
        rows: Vec<Vec<RawValue>>,
    },
    /// No result set; `n` rows affected.
    Affected(i64),
    /// Execute-direct fails with this error.
    Error { code: i32, message: String },
}

/// Everything the adapter asked the driver to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockLog {
    pub connect_strings: Vec<String>,
    pub immediate: Vec<String>,
    pub executed: Vec<String>,
    pub commits: usize,
    pub rollbacks: usize,
    pub statements_opened: Vec<u64>,
    pub statements_freed: Vec<u64>,
    pub disconnects: usize,
    pub freed_connections: usize,
}

#[derive(Debug)]
pub struct MockConnection {
    last_error: (i32, String),
}

#[derive(Debug)]
pub struct MockStatement {
    id: u64,
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<RawValue>>,
    position: Option<usize>,
    affected: i64,
}

#[derive(Debug)]
struct MockState {
    responses: HashMap<String, MockResponse>,
    connect_status: i32,
    connect_error: (i32, String),
    provide_handle: bool,
    interface_available: bool,
    init_succeeds: bool,
    free_succeeds: bool,
    next_statement: u64,
    log: MockLog,
}

/// A native driver that answers from a script instead of a server.
///
/// Unscripted statements succeed with no result set and zero affected rows.
#[derive(Debug)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Creates a driver that connects successfully and has no scripted statements.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                responses: HashMap::new(),
                connect_status: CONNECT_SUCCESS,
                connect_error: (0, String::new()),
                provide_handle: true,
                interface_available: true,
                init_succeeds: true,
                free_succeeds: true,
                next_statement: 1,
                log: MockLog::default(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(self, sql: &str, response: MockResponse) -> Self {
        self.state().responses.insert(sql.to_string(), response);
        self
    }

    /// Scripts a result set. Columns are `(name, wire type code)` pairs.
    pub fn with_rows(self, sql: &str, columns: &[(&str, u16)], rows: Vec<Vec<RawValue>>) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(ordinal, (name, wire_type))| ColumnDescriptor::new(*name, *wire_type, ordinal))
            .collect();
        self.respond(sql, MockResponse::Rows { columns, rows })
    }

    pub fn with_affected(self, sql: &str, affected: i64) -> Self {
        self.respond(sql, MockResponse::Affected(affected))
    }

    pub fn with_error(self, sql: &str, code: i32, message: &str) -> Self {
        self.respond(
            sql,
            MockResponse::Error {
                code,
                message: message.to_string(),
            },
        )
    }

    /// Connect returns `code` as its status and reports `message` as the error.
    pub fn with_connect_failure(self, code: i32, message: &str) -> Self {
        {
            let mut state = self.state();
            state.connect_status = code;
            state.connect_error = (code, message.to_string());
        }
        self
    }

    /// New-connection returns no handle.
    pub fn without_connection_handle(self) -> Self {
        self.state().provide_handle = false;
        self
    }

    /// The client library cannot be loaded.
    pub fn with_interface_unavailable(self) -> Self {
        self.state().interface_available = false;
        self
    }

    /// The client library loads but fails to initialize.
    pub fn with_init_failure(self) -> Self {
        self.state().init_succeeds = false;
        self
    }

    /// Free-statement reports failure (the handle is still counted as freed).
    pub fn with_failing_free_statement(self) -> Self {
        self.state().free_succeeds = false;
        self
    }

    /// Snapshot of the calls made so far.
    pub fn log(&self) -> MockLog {
        self.state().log.clone()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeDriver for MockDriver {
    type Connection = MockConnection;
    type Statement = MockStatement;

    fn initialize_interface(&self) -> bool {
        self.state().interface_available
    }

    fn init(&self) -> bool {
        self.state().init_succeeds
    }

    fn new_connection(&self) -> Option<MockConnection> {
        self.state().provide_handle.then(|| MockConnection {
            last_error: (0, String::new()),
        })
    }

    fn connect(&self, conn: &mut MockConnection, connection_string: &str) -> i32 {
        let mut state = self.state();
        state.log.connect_strings.push(connection_string.to_string());
        if state.connect_status != CONNECT_SUCCESS {
            conn.last_error = state.connect_error.clone();
        }
        state.connect_status
    }

    fn disconnect(&self, _conn: &mut MockConnection) {
        self.state().log.disconnects += 1;
    }

    fn free_connection(&self, _conn: MockConnection) {
        self.state().log.freed_connections += 1;
    }

    fn execute_immediate(&self, _conn: &mut MockConnection, sql: &str) -> bool {
        self.state().log.immediate.push(sql.to_string());
        true
    }

    fn execute_direct(&self, conn: &mut MockConnection, sql: &str) -> Option<MockStatement> {
        let mut state = self.state();
        state.log.executed.push(sql.to_string());

        let (columns, rows, affected) = match state.responses.get(sql).cloned() {
            Some(MockResponse::Error { code, message }) => {
                conn.last_error = (code, message);
                return None;
            }
            Some(MockResponse::Rows { columns, rows }) => {
                let affected = rows.len() as i64;
                (columns, rows, affected)
            }
            Some(MockResponse::Affected(n)) => (Vec::new(), Vec::new(), n),
            None => (Vec::new(), Vec::new(), 0),
        };

        let id = state.next_statement;
        state.next_statement += 1;
        state.log.statements_opened.push(id);
        Some(MockStatement {
            id,
            columns,
            rows,
            position: None,
            affected,
        })
    }

    fn error(&self, conn: &MockConnection) -> (i32, String) {
        conn.last_error.clone()
    }

    fn affected_rows(&self, stmt: &MockStatement) -> i64 {
        stmt.affected
    }

    fn commit(&self, _conn: &mut MockConnection) -> bool {
        self.state().log.commits += 1;
        true
    }

    fn rollback(&self, _conn: &mut MockConnection) -> bool {
        self.state().log.rollbacks += 1;
        true
    }

    fn free_statement(&self, stmt: MockStatement) -> bool {
        let mut state = self.state();
        state.log.statements_freed.push(stmt.id);
        state.free_succeeds
    }

    fn num_columns(&self, stmt: &MockStatement) -> i32 {
        i32::try_from(stmt.columns.len()).unwrap_or(i32::MAX)
    }

    fn column_info(&self, stmt: &MockStatement, index: usize) -> Option<ColumnDescriptor> {
        stmt.columns.get(index).cloned()
    }

    fn fetch_next(&self, stmt: &mut MockStatement) -> bool {
        let next = stmt.position.map_or(0, |p| p + 1);
        stmt.position = Some(next);
        next < stmt.rows.len()
    }

    fn get_column(&self, stmt: &MockStatement, index: usize) -> Option<RawValue> {
        stmt.rows.get(stmt.position?)?.get(index).cloned()
    }
}
