//! The generic driver contract.
//!
//! A driver crate implements these traits over its client library; the
//! generic layer ([`crate::Database`], [`crate::registry`]) only ever talks to
//! trait objects:
//!
//! - [`Driver`] - opens connections from a data source name
//! - [`Connection`] - one session; starts transactions and prepares statements
//! - [`Transaction`] - commit/rollback scope over a borrowed connection
//! - [`Statement`] - a prepared statement bound to its connection
//! - [`ExecResult`] - outcome of a statement that returns no rows
//! - [`Rows`] - forward-only cursor over a result set
//!
//! Every child handle borrows its parent mutably, so a connection cannot run a
//! second operation while a statement or cursor on it is still alive.

use crate::error::Result;
use crate::value::Value;

/// Entry point of a database driver.
pub trait Driver: Send + Sync {
    /// Open a new connection described by `dsn`.
    ///
    /// The format of `dsn` is driver-specific.
    fn open(&self, dsn: &str) -> Result<Box<dyn Connection>>;
}

/// A live connection to a database server.
pub trait Connection: Send {
    /// Start a transaction.
    ///
    /// Until the returned handle is committed, rolled back or dropped, the
    /// connection is unavailable.
    fn begin(&mut self) -> Result<Box<dyn Transaction + '_>>;

    /// Prepare a statement for execution on this connection.
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Statement + '_>>;

    /// Close the connection and release server resources.
    fn close(self: Box<Self>) -> Result<()>;
}

/// A transaction in progress.
///
/// Dropping a transaction without calling [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback) rolls it back.
pub trait Transaction {
    /// Prepare a statement that runs inside this transaction.
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Statement + '_>>;

    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}

/// A prepared statement.
pub trait Statement {
    /// Number of placeholder parameters the statement expects.
    fn num_input(&self) -> usize;

    /// Execute a statement that does not return rows (INSERT, UPDATE, DDL).
    fn exec(&mut self, args: &[Value]) -> Result<Box<dyn ExecResult>>;

    /// Execute a statement that returns rows.
    fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows + '_>>;

    /// Close the statement and release its server handle.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Outcome of [`Statement::exec`].
pub trait ExecResult {
    /// Auto-increment id generated by the statement, or 0.
    fn last_insert_id(&self) -> Result<i64>;

    fn rows_affected(&self) -> Result<i64>;
}

/// A forward-only cursor over query results.
pub trait Rows {
    /// Column names in result order.
    fn columns(&mut self) -> &[String];

    /// Fetch the next row into `dest`.
    ///
    /// `dest` must have one slot per column. Returns `Ok(false)` at the end
    /// of the data, and keeps returning `Ok(false)` on later calls.
    fn next(&mut self, dest: &mut [Value]) -> Result<bool>;

    /// Release the cursor, discarding any rows not yet fetched.
    fn close(self: Box<Self>) -> Result<()>;
}
