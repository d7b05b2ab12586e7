//! Data source name parsing.
//!
//! The accepted format is `user[:password]@host[:port][/database]`.
//!
//! The string is split on the *last* `@`, so passwords may contain `@`.
//! Host names never do. Within the credentials the first `:` separates user
//! from password; within the host part the first `/` separates the address
//! from the database name.

use std::fmt;
use std::str::FromStr;

use sqlbridge_core::Result;
use sqlbridge_core::error::{ConfigError, Error};

/// Port used when the address does not name one.
pub const DEFAULT_PORT: u16 = 3306;

/// Host used when the address part of the DSN is empty.
pub const DEFAULT_HOST: &str = "localhost";

const FORMAT: &str = "user[:password]@host[:port][/database]";

/// A parsed data source name.
#[derive(Clone, PartialEq, Eq)]
pub struct Dsn {
    /// `host[:port]` exactly as written
    pub addr: String,
    pub user: String,
    /// Empty when the DSN carries no password
    pub password: String,
    /// Empty when the DSN names no database
    pub database: String,
}

fn config_error(message: String) -> Error {
    Error::Config(ConfigError {
        message,
        source: None,
    })
}

impl Dsn {
    /// Parse a DSN string.
    ///
    /// Fails when there is no `@`, or when it is the first character (empty
    /// user). The error names the expected format and never echoes the input,
    /// which may hold a password.
    pub fn parse(dsn: &str) -> Result<Self> {
        let at = match dsn.rfind('@') {
            Some(pos) if pos > 0 => pos,
            _ => {
                return Err(config_error(format!(
                    "invalid DSN: expected {}",
                    FORMAT
                )));
            }
        };

        let (credentials, host_part) = (&dsn[..at], &dsn[at + 1..]);

        let (user, password) = credentials
            .split_once(':')
            .unwrap_or((credentials, ""));

        let (addr, database) = host_part.split_once('/').unwrap_or((host_part, ""));

        Ok(Self {
            addr: addr.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            database: database.to_string(),
        })
    }

    /// Split the address into host and port.
    ///
    /// The port defaults to [`DEFAULT_PORT`] and an empty host to
    /// [`DEFAULT_HOST`]. IPv6 literals must be bracketed when a port follows
    /// (`[::1]:3307`); the brackets are stripped from the returned host.
    pub fn host_port(&self) -> Result<(String, u16)> {
        let addr = self.addr.as_str();

        let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
            let end = rest
                .find(']')
                .ok_or_else(|| config_error("invalid DSN address: unclosed '['".to_string()))?;
            let host = &rest[..end];
            let after = &rest[end + 1..];
            let port = match after.strip_prefix(':') {
                Some(port) => Some(port),
                None if after.is_empty() => None,
                None => {
                    return Err(config_error(format!(
                        "invalid DSN address: unexpected '{}' after ']'",
                        after
                    )));
                }
            };
            (host, port)
        } else if addr.matches(':').count() > 1 {
            // Bare IPv6 literal without a port.
            (addr, None)
        } else {
            match addr.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (addr, None),
            }
        };

        let port = match port {
            None => DEFAULT_PORT,
            Some(p) => p
                .parse::<u16>()
                .map_err(|e| {
                    Error::Config(ConfigError {
                        message: format!("invalid DSN port '{}'", p),
                        source: Some(Box::new(e)),
                    })
                })?,
        };

        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        Ok((host.to_string(), port))
    }
}

impl FromStr for Dsn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Dsn {
    /// Renders the DSN with the password masked.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user)?;
        if !self.password.is_empty() {
            f.write_str(":***")?;
        }
        write!(f, "@{}", self.addr)?;
        if !self.database.is_empty() {
            write!(f, "/{}", self.database)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dsn")
            .field("addr", &self.addr)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_form() {
        let dsn = Dsn::parse("root:secret@127.0.0.1:3307/app").unwrap();
        assert_eq!(dsn.user, "root");
        assert_eq!(dsn.password, "secret");
        assert_eq!(dsn.addr, "127.0.0.1:3307");
        assert_eq!(dsn.database, "app");
    }

    #[test]
    fn test_without_password() {
        let dsn = Dsn::parse("root@localhost/app").unwrap();
        assert_eq!(dsn.user, "root");
        assert_eq!(dsn.password, "");
        assert_eq!(dsn.addr, "localhost");
        assert_eq!(dsn.database, "app");
    }

    #[test]
    fn test_without_database() {
        let dsn = Dsn::parse("root:pw@db.internal:3306").unwrap();
        assert_eq!(dsn.addr, "db.internal:3306");
        assert_eq!(dsn.database, "");
    }

    #[test]
    fn test_at_sign_in_password() {
        let dsn = Dsn::parse("app:p@ss@w0rd@db/main").unwrap();
        assert_eq!(dsn.user, "app");
        assert_eq!(dsn.password, "p@ss@w0rd");
        assert_eq!(dsn.addr, "db");
        assert_eq!(dsn.database, "main");
    }

    #[test]
    fn test_colon_in_password_kept() {
        let dsn = Dsn::parse("u:a:b@h").unwrap();
        assert_eq!(dsn.user, "u");
        assert_eq!(dsn.password, "a:b");
    }

    #[test]
    fn test_malformed() {
        for bad in ["", "localhost/app", "@localhost/app", "@"] {
            let err = Dsn::parse(bad).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{bad:?}");
            assert!(err.to_string().contains(FORMAT));
        }
    }

    #[test]
    fn test_error_does_not_echo_input() {
        let err = Dsn::parse("no-at-sign-secret").unwrap_err();
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_from_str() {
        let dsn: Dsn = "u@h".parse().unwrap();
        assert_eq!(dsn.user, "u");
        assert_eq!(dsn.addr, "h");
    }

    #[test]
    fn test_display_masks_password() {
        let dsn = Dsn::parse("root:secret@localhost:3306/app").unwrap();
        assert_eq!(dsn.to_string(), "root:***@localhost:3306/app");
        assert!(!format!("{dsn:?}").contains("secret"));

        let dsn = Dsn::parse("root@localhost").unwrap();
        assert_eq!(dsn.to_string(), "root@localhost");
    }

    #[test]
    fn test_host_port() {
        let hp = |s: &str| Dsn::parse(s).unwrap().host_port();

        assert_eq!(hp("u@db").unwrap(), ("db".to_string(), 3306));
        assert_eq!(hp("u@db:3307").unwrap(), ("db".to_string(), 3307));
        assert_eq!(hp("u@").unwrap(), ("localhost".to_string(), 3306));
        assert_eq!(hp("u@:3310/x").unwrap(), ("localhost".to_string(), 3310));
        assert_eq!(hp("u@[::1]:3307").unwrap(), ("::1".to_string(), 3307));
        assert_eq!(hp("u@[::1]").unwrap(), ("::1".to_string(), 3306));
        assert_eq!(hp("u@::1").unwrap(), ("::1".to_string(), 3306));
    }

    #[test]
    fn test_host_port_errors() {
        let hp = |s: &str| Dsn::parse(s).unwrap().host_port();

        assert!(matches!(hp("u@db:abc"), Err(Error::Config(_))));
        assert!(matches!(hp("u@db:70000"), Err(Error::Config(_))));
        assert!(matches!(hp("u@[::1"), Err(Error::Config(_))));
        assert!(matches!(hp("u@[::1]x"), Err(Error::Config(_))));
    }
}
