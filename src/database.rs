//! Database façade.
//!
//! Ties the connection manager, statement executor and row materializer
//! together behind the entry points an ORM layer calls.

use std::sync::Arc;

use crate::config::{AdapterOptions, Config, ConnectionConfig};
use crate::connection::ConnectionManager;
use crate::db::{ConversionRegistry, NativeDriver, Row, Value};
use crate::error::{AdapterError, Result};
use crate::query::{fetch_rows, FetchOptions, IdentifierCase, ResultSet, StatementExecutor};

/// A database reached through one native driver.
///
/// Holds a single connection, opened on first use. Every operation takes
/// exclusive use of it for its whole duration.
pub struct Database<D: NativeDriver> {
    manager: ConnectionManager<D>,
    registry: ConversionRegistry,
    convert_smallint_to_bool: bool,
}

impl<D: NativeDriver> Database<D> {
    /// Loads and initializes the driver. No connection is opened yet.
    pub fn new(driver: D, config: ConnectionConfig, options: AdapterOptions) -> Result<Self> {
        if !driver.initialize_interface() {
            return Err(AdapterError::connection(
                "Could not load SQLAnywhere DBCAPI library",
            ));
        }
        if !driver.init() {
            return Err(AdapterError::connection(
                "Could not initialize SQLAnywhere DBCAPI library",
            ));
        }
        config.validate()?;

        Ok(Self {
            manager: ConnectionManager::new(
                Arc::new(driver),
                config,
                options.application_timezone,
            ),
            registry: ConversionRegistry::new(options.application_timezone),
            convert_smallint_to_bool: options.convert_smallint_to_bool,
        })
    }

    /// Creates a database from a named connection in `config` (`default` if None).
    pub fn from_config(driver: D, config: &Config, name: Option<&str>) -> Result<Self> {
        let connection = config.get_connection(name).cloned().ok_or_else(|| {
            AdapterError::config(format!(
                "Connection '{}' not found in config file",
                name.unwrap_or("default")
            ))
        })?;
        Self::new(driver, connection, config.adapter)
    }

    pub fn driver(&self) -> &D {
        self.manager.driver()
    }

    pub fn conversion_registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    /// Database-scope switch for converting small integers to booleans.
    pub fn convert_smallint_to_bool(&self) -> bool {
        self.convert_smallint_to_bool
    }

    pub fn set_convert_smallint_to_bool(&mut self, convert: bool) {
        self.convert_smallint_to_bool = convert;
    }

    /// Runs `f` with a statement executor on the exclusively held connection.
    ///
    /// Inside `f`, statements go through the executor it receives. Calling
    /// back into this database from `f` fails with [`AdapterError::Internal`].
    pub fn synchronize<T>(
        &self,
        f: impl FnOnce(&mut StatementExecutor<'_, D>) -> Result<T>,
    ) -> Result<T> {
        let driver = self.manager.driver();
        self.manager
            .synchronize(|conn| f(&mut StatementExecutor::new(driver, conn)))
    }

    /// Executes `sql` and hands the open result to `on_result`.
    pub fn execute<T>(
        &self,
        sql: &str,
        on_result: impl FnOnce(&mut ResultSet<'_, D>) -> Result<T>,
    ) -> Result<T> {
        self.synchronize(|exec| exec.execute(sql, on_result))
    }

    /// Executes a statement and returns the number of affected rows.
    pub fn execute_dui(&self, sql: &str) -> Result<i64> {
        self.synchronize(|exec| exec.execute_dui(sql))
    }

    /// Executes an insert and returns the generated identity value.
    pub fn execute_insert(&self, sql: &str) -> Result<Option<Value>> {
        self.synchronize(|exec| exec.execute_insert(sql))
    }

    /// Runs `f` in an explicit transaction; see [`StatementExecutor::transaction`].
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut StatementExecutor<'_, D>) -> Result<T>,
    ) -> Result<T> {
        self.synchronize(|exec| exec.transaction(f))
    }

    /// A dataset with default options.
    pub fn dataset(&self) -> Dataset<'_, D> {
        Dataset {
            db: self,
            convert_smallint_to_bool: true,
            identifier_case: IdentifierCase::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Disconnects the held connection. The next operation reconnects.
    pub fn disconnect(&self) -> Result<()> {
        self.manager.close()
    }
}

/// Row-returning view over a database with its own fetch settings.
pub struct Dataset<'db, D: NativeDriver> {
    db: &'db Database<D>,
    convert_smallint_to_bool: bool,
    identifier_case: IdentifierCase,
}

impl<'db, D: NativeDriver> Dataset<'db, D> {
    /// Dataset-scope switch; conversion happens only if the database agrees.
    pub fn with_convert_smallint_to_bool(mut self, convert: bool) -> Self {
        self.convert_smallint_to_bool = convert;
        self
    }

    pub fn with_identifier_case(mut self, identifier_case: IdentifierCase) -> Self {
        self.identifier_case = identifier_case;
        self
    }

    /// Options for one fetch, with both boolean scopes folded together.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            convert_smallint_to_bool: self.convert_smallint_to_bool
                && self.db.convert_smallint_to_bool,
            identifier_case: self.identifier_case,
        }
    }

    /// Delivers every row of `sql` to `on_row`; returns the output columns.
    pub fn fetch_rows(
        &self,
        sql: &str,
        on_row: impl FnMut(Row) -> Result<()>,
    ) -> Result<Vec<String>> {
        let options = self.fetch_options();
        let registry = self.db.registry;
        self.db
            .synchronize(|exec| fetch_rows(exec, &registry, &options, sql, on_row))
    }

    /// Like [`Dataset::fetch_rows`], on an executor the caller already holds.
    pub fn fetch_rows_with(
        &self,
        executor: &mut StatementExecutor<'_, D>,
        sql: &str,
        on_row: impl FnMut(Row) -> Result<()>,
    ) -> Result<Vec<String>> {
        fetch_rows(executor, &self.db.registry, &self.fetch_options(), sql, on_row)
    }

    /// Collects every row of `sql`.
    pub fn all(&self, sql: &str) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        self.fetch_rows(sql, |row| {
            rows.push(row);
            Ok(())
        })?;
        Ok(rows)
    }
}
