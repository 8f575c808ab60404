//! Connection manager for native session lifecycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tracing::{debug, info, warn};

use crate::config::{redact_connection_string, ConnectionConfig};
use crate::db::{ApplicationTimezone, NativeDriver, CONNECT_SUCCESS};
use crate::error::{AdapterError, Result};

/// Issued on every new connection when the application runs in UTC.
pub const DISABLE_TIMEZONE_ADJUSTMENT: &str = "SET TEMPORARY OPTION time_zone_adjustment=0";

/// A connected native session.
///
/// Owning the value is owning the session: [`ConnectionManager::disconnect`]
/// consumes it, so a disconnected handle cannot be reused.
pub struct Connection<D: NativeDriver> {
    handle: D::Connection,
    in_transaction: bool,
}

impl<D: NativeDriver> Connection<D> {
    pub(crate) fn handle(&self) -> &D::Connection {
        &self.handle
    }

    pub(crate) fn handle_mut(&mut self) -> &mut D::Connection {
        &mut self.handle
    }

    /// Whether an explicit transaction is open on this connection.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub(crate) fn set_in_transaction(&mut self, open: bool) {
        self.in_transaction = open;
    }
}

/// Manages the single native connection used by a database.
pub struct ConnectionManager<D: NativeDriver> {
    driver: Arc<D>,
    config: ConnectionConfig,
    timezone: ApplicationTimezone,
    active: Mutex<Option<Connection<D>>>,
    /// Thread currently inside `synchronize` or `close`.
    owner: Mutex<Option<ThreadId>>,
}

/// Exclusive hold on the connection slot. Clears the owner before the slot
/// is unlocked.
struct Held<'m, D: NativeDriver> {
    active: MutexGuard<'m, Option<Connection<D>>>,
    owner: &'m Mutex<Option<ThreadId>>,
}

impl<D: NativeDriver> Drop for Held<'_, D> {
    fn drop(&mut self) {
        *lock_owner(self.owner) = None;
    }
}

fn lock_owner(owner: &Mutex<Option<ThreadId>>) -> MutexGuard<'_, Option<ThreadId>> {
    owner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<D: NativeDriver> ConnectionManager<D> {
    /// Creates a new connection manager. No connection is opened yet.
    pub fn new(driver: Arc<D>, config: ConnectionConfig, timezone: ApplicationTimezone) -> Self {
        Self {
            driver,
            config,
            timezone,
            active: Mutex::new(None),
            owner: Mutex::new(None),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Opens a new native session.
    ///
    /// Any status other than [`CONNECT_SUCCESS`] is fatal; the half-created
    /// handle is released before the error is returned.
    pub fn connect(&self) -> Result<Connection<D>> {
        let conn_str = self.config.to_connection_string()?;
        debug!("Connecting with {}", redact_connection_string(&conn_str));

        let mut handle = self
            .driver
            .new_connection()
            .ok_or_else(|| AdapterError::connection("Could not connect: no connection handle"))?;

        let status = self.driver.connect(&mut handle, &conn_str);
        if status != CONNECT_SUCCESS {
            let (code, message) = self.driver.error(&handle);
            self.driver.free_connection(handle);
            warn!("Connect to {} failed with status {status}", self.config.display_string());
            return Err(AdapterError::connection(format!(
                "Could not connect: {message} ({code})"
            )));
        }

        if self.timezone == ApplicationTimezone::Utc
            && !self
                .driver
                .execute_immediate(&mut handle, DISABLE_TIMEZONE_ADJUSTMENT)
        {
            let (code, message) = self.driver.error(&handle);
            warn!("Could not disable time zone adjustment: {message} ({code})");
        }

        info!("Connected to {}", self.config.display_string());
        Ok(Connection {
            handle,
            in_transaction: false,
        })
    }

    /// Closes a session and releases its handle.
    pub fn disconnect(&self, mut conn: Connection<D>) {
        self.driver.disconnect(&mut conn.handle);
        self.driver.free_connection(conn.handle);
        debug!("Disconnected from {}", self.config.display_string());
    }

    fn held_by_current_thread(&self) -> bool {
        *lock_owner(&self.owner) == Some(thread::current().id())
    }

    /// Takes the connection slot for the current thread.
    ///
    /// Fails instead of blocking when this thread already holds it. A slot
    /// left poisoned by a panicking holder is recovered, and a transaction
    /// that holder left open is rolled back.
    fn acquire(&self) -> Result<Held<'_, D>> {
        if self.held_by_current_thread() {
            return Err(AdapterError::internal(
                "connection already held by this thread; use the executor passed to the callback",
            ));
        }

        let active = match self.active.lock() {
            Ok(active) => active,
            Err(poisoned) => {
                self.active.clear_poison();
                let mut active = poisoned.into_inner();
                if let Some(conn) = active.as_mut() {
                    self.abandon_transaction(conn);
                }
                active
            }
        };

        *lock_owner(&self.owner) = Some(thread::current().id());
        Ok(Held {
            active,
            owner: &self.owner,
        })
    }

    fn abandon_transaction(&self, conn: &mut Connection<D>) {
        if !conn.in_transaction {
            return;
        }
        warn!("Rolling back transaction left open by a panic");
        conn.in_transaction = false;
        if !self.driver.rollback(&mut conn.handle) {
            let (code, message) = self.driver.error(&conn.handle);
            warn!("Rollback failed: {message} ({code})");
        }
    }

    /// Runs `f` with exclusive use of the connection, connecting first if needed.
    ///
    /// Calling back into the manager from inside `f` on the same thread is an
    /// [`AdapterError::Internal`] error.
    pub fn synchronize<T>(&self, f: impl FnOnce(&mut Connection<D>) -> Result<T>) -> Result<T> {
        let mut held = self.acquire()?;

        if held.active.is_none() {
            *held.active = Some(self.connect()?);
        }
        match held.active.as_mut() {
            Some(conn) => f(conn),
            None => Err(AdapterError::internal("connection slot empty after connect")),
        }
    }

    /// Check if a connection is currently held.
    pub fn is_connected(&self) -> bool {
        if self.held_by_current_thread() {
            return true;
        }
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Disconnects the held connection, if any.
    pub fn close(&self) -> Result<()> {
        let taken = self.acquire()?.active.take();
        if let Some(conn) = taken {
            self.disconnect(conn);
        }
        Ok(())
    }
}
