//! Core types and traits for sqlbridge.
//!
//! This crate is the generic half of sqlbridge. It knows nothing about any
//! particular database; driver crates plug into it:
//!
//! - [`Value`] - scalar exchanged with drivers in both directions
//! - [`driver`] - the contract a driver implements (`Driver`, `Connection`,
//!   `Transaction`, `Statement`, `ExecResult`, `Rows`)
//! - [`registry`] - process-wide table of named drivers
//! - [`Database`] - one-shot exec/query helpers over a single connection
//! - [`Row`] - materialized result row with typed accessors

pub mod database;
pub mod driver;
pub mod error;
pub mod registry;
pub mod row;
pub mod value;

pub use database::{Database, ExecSummary, collect_rows, exec_statement, query_statement};
pub use driver::{Connection, Driver, ExecResult, Rows, Statement, Transaction};
pub use error::{Error, Result};
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
