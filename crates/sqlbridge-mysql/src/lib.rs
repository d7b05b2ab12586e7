//! MySQL driver for sqlbridge.
//!
//! This crate adapts the blocking [`mysql`] client to the generic driver
//! contract in `sqlbridge-core`. The client owns the wire protocol,
//! authentication and server-side statement handles; this crate only
//! translates:
//!
//! - DSN strings into client options ([`dsn`], [`config`])
//! - contract calls into client calls ([`connection`], [`statement`], [`rows`])
//! - MySQL column types into sqlbridge values ([`types`])
//! - client errors into sqlbridge errors ([`error`])
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlbridge_core::{Database, Value};
//!
//! sqlbridge_mysql::register()?;
//!
//! let mut db = Database::open("mysql", "root:secret@localhost:3306/app")?;
//! db.exec("INSERT INTO users (name) VALUES (?)", &[Value::from("alice")])?;
//! let rows = db.query("SELECT id, name FROM users", &[])?;
//! ```

pub mod config;
pub mod connection;
pub mod driver;
pub mod dsn;
pub mod error;
pub mod rows;
pub mod statement;
pub mod types;

pub use config::MySqlConfig;
pub use connection::{MySqlConnection, MySqlTransaction};
pub use driver::{MySqlDriver, open, register};
pub use dsn::Dsn;
pub use rows::MySqlRows;
pub use statement::{MySqlResult, MySqlStatement};
pub use types::{FieldType, NativeType};
