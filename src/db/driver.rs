//! Native client interface consumed by the adapter.
//!
//! Mirrors the primitive surface of SQL Anywhere's C API (`sqlany_*`
//! functions). Implementations wrap a loaded client library; the crate ships
//! an in-memory [`MockDriver`](super::MockDriver) for tests.

use super::types::{ColumnDescriptor, RawValue};

/// Status the connect primitive returns on success.
pub const CONNECT_SUCCESS: i32 = 1;

/// Primitive operations of a native database client library.
///
/// Handles are opaque to the adapter. Connection handles are only ever used
/// by one operation at a time; statement handles never outlive the call that
/// created them.
pub trait NativeDriver: Send + Sync {
    /// Native session handle.
    type Connection: Send;

    /// Native statement / result set handle.
    type Statement;

    /// Loads the client library entry points. Returns false if unavailable.
    fn initialize_interface(&self) -> bool;

    /// Initializes the client library. Returns false on failure.
    fn init(&self) -> bool;

    /// Allocates an unconnected session handle.
    fn new_connection(&self) -> Option<Self::Connection>;

    /// Connects `conn` using `connection_string`; [`CONNECT_SUCCESS`] on success.
    fn connect(&self, conn: &mut Self::Connection, connection_string: &str) -> i32;

    fn disconnect(&self, conn: &mut Self::Connection);

    fn free_connection(&self, conn: Self::Connection);

    /// Executes a statement that produces no result set.
    fn execute_immediate(&self, conn: &mut Self::Connection, sql: &str) -> bool;

    /// Executes `sql`, returning `None` on error.
    fn execute_direct(&self, conn: &mut Self::Connection, sql: &str) -> Option<Self::Statement>;

    /// Last error on `conn` as `(code, message)`.
    fn error(&self, conn: &Self::Connection) -> (i32, String);

    fn affected_rows(&self, stmt: &Self::Statement) -> i64;

    fn commit(&self, conn: &mut Self::Connection) -> bool;

    fn rollback(&self, conn: &mut Self::Connection) -> bool;

    /// Releases a statement handle. Returns false if the driver reported a failure.
    fn free_statement(&self, stmt: Self::Statement) -> bool;

    /// Number of result columns; zero or negative when there is no result set.
    fn num_columns(&self, stmt: &Self::Statement) -> i32;

    fn column_info(&self, stmt: &Self::Statement, index: usize) -> Option<ColumnDescriptor>;

    /// Advances the cursor. Returns false once rows are exhausted.
    fn fetch_next(&self, stmt: &mut Self::Statement) -> bool;

    /// Value of column `index` at the current cursor position, or `None` on error.
    fn get_column(&self, stmt: &Self::Statement, index: usize) -> Option<RawValue>;
}
