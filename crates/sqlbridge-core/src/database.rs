//! A small front end over one driver connection.
//!
//! [`Database`] covers the common one-shot paths (prepare, run, close) so
//! callers do not have to juggle statement and cursor handles for simple
//! queries. For repeated execution, use [`Database::prepare`] and keep the
//! statement around.

use std::sync::Arc;

use crate::driver::{Connection, Rows, Statement, Transaction};
use crate::error::{Error, ProtocolError, Result};
use crate::registry;
use crate::row::{ColumnInfo, Row};
use crate::value::Value;

/// Summary of a statement that returned no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecSummary {
    pub last_insert_id: i64,
    pub rows_affected: i64,
}

/// One connection opened through a registered driver.
pub struct Database {
    driver: String,
    conn: Box<dyn Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open a connection through the driver registered as `driver`.
    pub fn open(driver: &str, dsn: &str) -> Result<Self> {
        let conn = registry::open(driver, dsn)?;
        Ok(Self::from_connection(driver, conn))
    }

    /// Wrap an already-open connection.
    pub fn from_connection(driver: &str, conn: Box<dyn Connection>) -> Self {
        Self {
            driver: driver.to_string(),
            conn,
        }
    }

    pub fn driver_name(&self) -> &str {
        &self.driver
    }

    /// Run a statement that returns no rows.
    pub fn exec(&mut self, sql: &str, args: &[Value]) -> Result<ExecSummary> {
        tracing::trace!(sql = %sql, args = args.len(), "exec");
        let mut stmt = self.conn.prepare(sql).map_err(|e| e.with_sql(sql))?;
        let summary = exec_statement(stmt.as_mut(), args).map_err(|e| e.with_sql(sql))?;
        stmt.close()?;
        Ok(summary)
    }

    /// Run a query and collect every row.
    pub fn query(&mut self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        tracing::trace!(sql = %sql, args = args.len(), "query");
        let mut stmt = self.conn.prepare(sql).map_err(|e| e.with_sql(sql))?;
        let rows = query_statement(stmt.as_mut(), args).map_err(|e| e.with_sql(sql))?;
        stmt.close()?;
        tracing::debug!(rows = rows.len(), "Query returned rows");
        Ok(rows)
    }

    /// Run a query and return its first row, if any.
    pub fn query_one(&mut self, sql: &str, args: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, args)?.into_iter().next())
    }

    /// Prepare a statement for repeated use.
    pub fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        self.conn.prepare(sql).map_err(|e| e.with_sql(sql))
    }

    /// Start a transaction.
    pub fn begin(&mut self) -> Result<Box<dyn Transaction + '_>> {
        tracing::debug!(driver = %self.driver, "Beginning transaction");
        self.conn.begin()
    }

    pub fn close(self) -> Result<()> {
        tracing::debug!(driver = %self.driver, "Closing database connection");
        self.conn.close()
    }
}

fn check_arity(stmt: &dyn Statement, args: &[Value]) -> Result<()> {
    let expected = stmt.num_input();
    if expected == args.len() {
        Ok(())
    } else {
        Err(Error::Protocol(ProtocolError {
            message: format!(
                "statement expects {} arguments, got {}",
                expected,
                args.len()
            ),
            source: None,
        }))
    }
}

/// Execute a prepared statement and snapshot its result.
pub fn exec_statement(stmt: &mut (dyn Statement + '_), args: &[Value]) -> Result<ExecSummary> {
    check_arity(stmt, args)?;
    let result = stmt.exec(args)?;
    Ok(ExecSummary {
        last_insert_id: result.last_insert_id()?,
        rows_affected: result.rows_affected()?,
    })
}

/// Run a prepared query, collect its rows and close the cursor.
pub fn query_statement(stmt: &mut (dyn Statement + '_), args: &[Value]) -> Result<Vec<Row>> {
    check_arity(stmt, args)?;
    let mut rows = stmt.query(args)?;
    let collected = collect_rows(rows.as_mut())?;
    rows.close()?;
    Ok(collected)
}

/// Drain a cursor into rows, in the order the server sent them.
pub fn collect_rows(rows: &mut (dyn Rows + '_)) -> Result<Vec<Row>> {
    let columns = Arc::new(ColumnInfo::new(rows.columns().to_vec()));
    let width = columns.len();
    let mut out = Vec::new();
    let mut dest = vec![Value::Null; width];

    while rows.next(&mut dest)? {
        let values = std::mem::replace(&mut dest, vec![Value::Null; width]);
        out.push(Row::with_columns(Arc::clone(&columns), values));
    }

    tracing::trace!(rows = out.len(), columns = width, "Collected rows");
    Ok(out)
}
