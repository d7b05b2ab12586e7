//! MySQL connection configuration.
//!
//! [`MySqlConfig`] holds everything needed to dial a server. It is usually
//! built from a [`Dsn`], then tuned with the builder methods before being
//! turned into client options.

use std::time::Duration;

use mysql::OptsBuilder;
use sqlbridge_core::Result;

use crate::dsn::{DEFAULT_HOST, DEFAULT_PORT, Dsn};

/// MySQL connection configuration.
#[derive(Clone)]
pub struct MySqlConfig {
    /// Hostname or IP address
    pub host: String,
    /// Port number (default: 3306)
    pub port: u16,
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: Option<String>,
    /// Default database selected at connect time
    pub database: Option<String>,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Socket read timeout (none by default)
    pub read_timeout: Option<Duration>,
    /// Socket write timeout (none by default)
    pub write_timeout: Option<Duration>,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: None,
            database: None,
            connect_timeout: Duration::from_secs(30),
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl std::fmt::Debug for MySqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

impl MySqlConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from a parsed DSN.
    ///
    /// An empty password or database in the DSN means "none".
    pub fn from_dsn(dsn: &Dsn) -> Result<Self> {
        let (host, port) = dsn.host_port()?;
        let mut config = Self::new().host(host).port(port).user(dsn.user.as_str());
        if !dsn.password.is_empty() {
            config = config.password(dsn.password.as_str());
        }
        if !dsn.database.is_empty() {
            config = config.database(dsn.database.as_str());
        }
        Ok(config)
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Get the socket address string for connection.
    ///
    /// IPv6 hosts are bracketed.
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Translate into options for the client library.
    ///
    /// The client's statement cache is disabled: every prepared statement
    /// handed out by this crate owns its server-side handle and closes it.
    pub fn to_opts(&self) -> OptsBuilder {
        OptsBuilder::new()
            .ip_or_hostname(Some(self.host.as_str()))
            .tcp_port(self.port)
            .user(Some(self.user.as_str()))
            .pass(self.password.as_deref())
            .db_name(self.database.as_deref())
            .tcp_connect_timeout(Some(self.connect_timeout))
            .read_timeout(self.read_timeout)
            .write_timeout(self.write_timeout)
            .stmt_cache_size(Some(0))
    }
}
