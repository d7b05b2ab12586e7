//! Prepared statements and execution results.

use mysql::prelude::Queryable;
use sqlbridge_core::error::{Error, TypeError};
use sqlbridge_core::{ExecResult, Result, Rows, Statement, Value};

use crate::error::from_mysql;
use crate::rows::MySqlRows;
use crate::types::encode_params;

/// A server-side prepared statement on a borrowed connection.
///
/// The server handle is released by [`Statement::close`], or on drop.
pub struct MySqlStatement<'c> {
    conn: &'c mut mysql::Conn,
    stmt: Option<mysql::Statement>,
    sql: String,
}

impl<'c> MySqlStatement<'c> {
    /// Prepare `sql` on `conn`.
    pub fn prepare(conn: &'c mut mysql::Conn, sql: &str) -> Result<Self> {
        let stmt = conn
            .prep(sql)
            .map_err(|e| from_mysql(e).with_sql(sql))?;
        tracing::trace!(
            sql = %sql,
            id = stmt.id(),
            params = stmt.num_params(),
            "Prepared statement"
        );
        Ok(Self {
            conn,
            stmt: Some(stmt),
            sql: sql.to_string(),
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of columns the statement produces (0 for non-queries).
    pub fn num_columns(&self) -> usize {
        self.stmt
            .as_ref()
            .map_or(0, |s| usize::from(s.num_columns()))
    }
}

impl Statement for MySqlStatement<'_> {
    fn num_input(&self) -> usize {
        self.stmt
            .as_ref()
            .map_or(0, |s| usize::from(s.num_params()))
    }

    fn exec(&mut self, args: &[Value]) -> Result<Box<dyn ExecResult>> {
        let Some(stmt) = self.stmt.as_ref() else {
            return Err(closed(&self.sql));
        };
        tracing::trace!(sql = %self.sql, args = args.len(), "exec");

        self.conn
            .exec_drop(stmt, encode_params(args))
            .map_err(|e| from_mysql(e).with_sql(&self.sql))?;

        Ok(Box::new(MySqlResult {
            last_insert_id: self.conn.last_insert_id(),
            affected_rows: self.conn.affected_rows(),
        }))
    }

    fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows + '_>> {
        let Some(stmt) = self.stmt.as_ref() else {
            return Err(closed(&self.sql));
        };
        tracing::trace!(sql = %self.sql, args = args.len(), "query");

        let result = self
            .conn
            .exec_iter(stmt, encode_params(args))
            .map_err(|e| from_mysql(e).with_sql(&self.sql))?;
        Ok(Box::new(MySqlRows::new(result)))
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        if let Some(stmt) = self.stmt.take() {
            self.conn.close(stmt).map_err(from_mysql)?;
            tracing::trace!(sql = %self.sql, "Closed statement");
        }
        Ok(())
    }
}

impl Drop for MySqlStatement<'_> {
    fn drop(&mut self) {
        if let Some(stmt) = self.stmt.take() {
            if let Err(e) = self.conn.close(stmt) {
                tracing::warn!(sql = %self.sql, error = %e, "Failed to close statement on drop");
            }
        }
    }
}

fn closed(sql: &str) -> Error {
    Error::Custom(format!("statement already closed: {}", sql))
}

/// Counters reported by the server after a statement without rows.
///
/// Both values are captured right after execution, so later statements on the
/// same connection do not change them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MySqlResult {
    pub last_insert_id: u64,
    pub affected_rows: u64,
}

fn to_i64(what: &'static str, v: u64) -> Result<i64> {
    i64::try_from(v).map_err(|_| {
        Error::Type(TypeError {
            expected: what,
            actual: format!("{} exceeds i64::MAX", v),
            column: None,
        })
    })
}

impl ExecResult for MySqlResult {
    fn last_insert_id(&self) -> Result<i64> {
        to_i64("last insert id", self.last_insert_id)
    }

    fn rows_affected(&self) -> Result<i64> {
        to_i64("affected row count", self.affected_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_counters() {
        let result = MySqlResult {
            last_insert_id: 42,
            affected_rows: 3,
        };
        assert_eq!(result.last_insert_id().unwrap(), 42);
        assert_eq!(result.rows_affected().unwrap(), 3);
    }

    #[test]
    fn test_result_overflow() {
        let result = MySqlResult {
            last_insert_id: u64::MAX,
            affected_rows: 0,
        };
        assert!(matches!(result.last_insert_id(), Err(Error::Type(_))));
        assert_eq!(result.rows_affected().unwrap(), 0);
    }

    #[test]
    fn test_closed_message() {
        assert_eq!(
            closed("SELECT 1").to_string(),
            "statement already closed: SELECT 1"
        );
    }
}
