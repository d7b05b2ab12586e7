//! Driver entry point and registration.

use std::sync::{Arc, Mutex, PoisonError};

use sqlbridge_core::{Connection, Driver, Result, registry};

use crate::config::MySqlConfig;
use crate::connection::MySqlConnection;
use crate::dsn::Dsn;

/// The MySQL driver.
///
/// Accepts DSNs of the form `user[:password]@host[:port][/database]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl MySqlDriver {
    /// Name the driver registers under.
    pub const NAME: &'static str = "mysql";

    /// Parse `dsn` and connect, returning the concrete connection type.
    pub fn connect(&self, dsn: &str) -> Result<MySqlConnection> {
        let dsn = Dsn::parse(dsn)?;
        tracing::debug!(dsn = %dsn, "Opening MySQL connection");
        MySqlConnection::connect(MySqlConfig::from_dsn(&dsn)?)
    }
}

impl Driver for MySqlDriver {
    fn open(&self, dsn: &str) -> Result<Box<dyn Connection>> {
        Ok(Box::new(self.connect(dsn)?))
    }
}

/// Register [`MySqlDriver`] with the process-wide registry as `"mysql"`.
///
/// Safe to call any number of times once it has succeeded. Fails with
/// `DuplicateDriver` while another driver holds the name.
pub fn register() -> Result<()> {
    static REGISTERED: Mutex<bool> = Mutex::new(false);
    let mut registered = REGISTERED.lock().unwrap_or_else(PoisonError::into_inner);
    if *registered {
        return Ok(());
    }
    registry::register(MySqlDriver::NAME, Arc::new(MySqlDriver))?;
    *registered = true;
    tracing::debug!(name = MySqlDriver::NAME, "Registered MySQL driver");
    Ok(())
}

/// Connect directly, without going through the registry.
pub fn open(dsn: &str) -> Result<MySqlConnection> {
    MySqlDriver.connect(dsn)
}
