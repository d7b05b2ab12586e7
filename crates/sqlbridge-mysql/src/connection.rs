//! MySQL connection and transaction wrappers.
//!
//! [`MySqlConnection`] owns one client connection. Statements and
//! transactions borrow it, so at most one operation is in flight at a time.

use mysql::prelude::Queryable;
use sqlbridge_core::error::{Error, TransactionError, TransactionErrorKind};
use sqlbridge_core::{Connection, Result, Statement, Transaction};

use crate::config::MySqlConfig;
use crate::error::{from_connect, from_mysql};
use crate::statement::MySqlStatement;

/// A connection to a MySQL server.
pub struct MySqlConnection {
    conn: mysql::Conn,
    config: MySqlConfig,
}

impl std::fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnection")
            .field("connection_id", &self.conn.connection_id())
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}

impl MySqlConnection {
    /// Establish a new connection to the MySQL server.
    pub fn connect(config: MySqlConfig) -> Result<Self> {
        tracing::debug!(
            addr = %config.socket_addr(),
            user = %config.user,
            database = ?config.database,
            "Connecting to MySQL"
        );

        let conn = mysql::Conn::new(config.to_opts()).map_err(from_connect)?;

        tracing::debug!(
            connection_id = conn.connection_id(),
            server_version = ?conn.server_version(),
            "Connected to MySQL"
        );
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &MySqlConfig {
        &self.config
    }

    /// Server-assigned id of this connection.
    pub fn connection_id(&self) -> u32 {
        self.conn.connection_id()
    }

    /// Server version as (major, minor, patch).
    pub fn server_version(&self) -> (u16, u16, u16) {
        self.conn.server_version()
    }

    /// Run a statement through the text protocol, discarding any result.
    pub fn execute_raw(&mut self, sql: &str) -> Result<()> {
        tracing::trace!(sql = %sql, "execute_raw");
        self.conn
            .query_drop(sql)
            .map_err(|e| from_mysql(e).with_sql(sql))
    }

    /// Prepare a statement with its concrete type.
    pub fn prepare_statement(&mut self, sql: &str) -> Result<MySqlStatement<'_>> {
        MySqlStatement::prepare(&mut self.conn, sql)
    }

    /// Start a transaction with its concrete type.
    pub fn begin_transaction(&mut self) -> Result<MySqlTransaction<'_>> {
        MySqlTransaction::begin(&mut self.conn)
    }
}

impl Connection for MySqlConnection {
    fn begin(&mut self) -> Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(self.begin_transaction()?))
    }

    fn prepare(&mut self, query: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(self.prepare_statement(query)?))
    }

    fn close(self: Box<Self>) -> Result<()> {
        tracing::debug!(connection_id = self.conn.connection_id(), "Closing MySQL connection");
        // Dropping the client sends COM_QUIT.
        drop(self);
        Ok(())
    }
}

/// A transaction on a borrowed connection.
///
/// Autocommit is switched off for the duration and restored once the
/// transaction ends. Dropping an unfinished transaction rolls it back.
pub struct MySqlTransaction<'c> {
    conn: &'c mut mysql::Conn,
    finished: bool,
}

impl<'c> MySqlTransaction<'c> {
    fn begin(conn: &'c mut mysql::Conn) -> Result<Self> {
        conn.query_drop("SET autocommit = 0").map_err(from_mysql)?;
        if let Err(e) = conn.query_drop("START TRANSACTION") {
            if let Err(restore) = conn.query_drop("SET autocommit = 1") {
                tracing::warn!(error = %restore, "Failed to restore autocommit after START TRANSACTION failed");
            }
            return Err(from_mysql(e));
        }
        tracing::debug!("Transaction started");
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// Prepare a statement with its concrete type.
    pub fn prepare_statement(&mut self, sql: &str) -> Result<MySqlStatement<'_>> {
        MySqlStatement::prepare(self.conn, sql)
    }

    /// Run `verb` (`COMMIT` or `ROLLBACK`), then restore autocommit.
    fn finish(&mut self, verb: &str, kind: TransactionErrorKind) -> Result<()> {
        self.finished = true;
        let outcome = self.conn.query_drop(verb).map_err(from_mysql);
        let restored = self.conn.query_drop("SET autocommit = 1");
        outcome?;
        restored.map_err(|e| {
            Error::Transaction(TransactionError {
                kind,
                message: format!("{} succeeded but autocommit was not restored: {}", verb, e),
            })
        })?;
        tracing::debug!(action = verb, "Transaction finished");
        Ok(())
    }
}

impl Transaction for MySqlTransaction<'_> {
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(self.prepare_statement(query)?))
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish("COMMIT", TransactionErrorKind::Commit)
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK", TransactionErrorKind::Rollback)
    }
}

impl Drop for MySqlTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.finish("ROLLBACK", TransactionErrorKind::Rollback) {
                tracing::warn!(error = %e, "Rollback of abandoned transaction failed");
            }
        }
    }
}
