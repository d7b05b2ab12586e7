//! Process-wide table of named drivers.
//!
//! Drivers register once under a short name (`"mysql"`), after which any code
//! in the process can open connections by name:
//!
//! ```ignore
//! sqlbridge_mysql::register()?;
//! let conn = sqlbridge_core::registry::open("mysql", "root:pw@localhost/app")?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::driver::{Connection, Driver};
use crate::error::{DriverError, DriverErrorKind, Error, Result};

type DriverMap = HashMap<String, Arc<dyn Driver>>;

fn drivers_table() -> &'static RwLock<DriverMap> {
    static DRIVERS: OnceLock<RwLock<DriverMap>> = OnceLock::new();
    DRIVERS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Make a driver available under `name`.
///
/// Fails with [`DriverErrorKind::DuplicateDriver`] if the name is taken.
pub fn register(name: &str, driver: Arc<dyn Driver>) -> Result<()> {
    let mut table = drivers_table()
        .write()
        .unwrap_or_else(PoisonError::into_inner);

    if table.contains_key(name) {
        return Err(Error::Driver(DriverError {
            kind: DriverErrorKind::DuplicateDriver,
            name: name.to_string(),
        }));
    }

    table.insert(name.to_string(), driver);
    tracing::debug!(driver = name, "Registered driver");
    Ok(())
}

pub fn is_registered(name: &str) -> bool {
    drivers_table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(name)
}

/// Names of all registered drivers, sorted.
pub fn drivers() -> Vec<String> {
    let mut names: Vec<String> = drivers_table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

/// Look up a driver by name.
pub fn lookup(name: &str) -> Result<Arc<dyn Driver>> {
    drivers_table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
        .ok_or_else(|| {
            Error::Driver(DriverError {
                kind: DriverErrorKind::UnknownDriver,
                name: name.to_string(),
            })
        })
}

/// Open a connection through the driver registered as `name`.
///
/// The table lock is released before the driver dials out.
pub fn open(name: &str, dsn: &str) -> Result<Box<dyn Connection>> {
    let driver = lookup(name)?;
    tracing::debug!(driver = name, "Opening connection");
    driver.open(dsn)
}
