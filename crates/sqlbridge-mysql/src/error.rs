//! Translation of client library errors into sqlbridge errors.
//!
//! Messages pass through unchanged and the client error is kept as the
//! `source`. Server errors are classified by their MySQL error code.

use std::io;

use sqlbridge_core::error::{
    ConnectionError, ConnectionErrorKind, Error, ProtocolError, QueryError, QueryErrorKind,
};

/// Classify a MySQL server error code.
pub fn query_kind(code: u16) -> QueryErrorKind {
    match code {
        // ER_DUP_ENTRY, ER_ROW_IS_REFERENCED_2, ER_NO_REFERENCED_ROW_2, ER_BAD_NULL_ERROR
        1062 | 1451 | 1452 | 1048 => QueryErrorKind::Constraint,
        // ER_PARSE_ERROR
        1064 => QueryErrorKind::Syntax,
        // ER_NO_SUCH_TABLE, ER_BAD_FIELD_ERROR, ER_BAD_DB_ERROR
        1146 | 1054 | 1049 => QueryErrorKind::NotFound,
        1213 => QueryErrorKind::Deadlock,
        // ER_LOCK_WAIT_TIMEOUT
        1205 => QueryErrorKind::Timeout,
        1044 | 1045 | 1142 | 1143 => QueryErrorKind::Permission,
        // ER_DATA_TOO_LONG
        1406 => QueryErrorKind::DataTruncation,
        _ => QueryErrorKind::Database,
    }
}

fn io_kind(err: &io::Error, connecting: bool) -> ConnectionErrorKind {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => ConnectionErrorKind::Refused,
        _ if connecting => ConnectionErrorKind::Connect,
        _ => ConnectionErrorKind::Disconnected,
    }
}

fn connection(kind: ConnectionErrorKind, err: mysql::Error) -> Error {
    Error::Connection(ConnectionError {
        kind,
        message: err.to_string(),
        source: Some(Box::new(err)),
    })
}

fn translate(err: mysql::Error, connecting: bool) -> Error {
    match err {
        mysql::Error::MySqlError(ref server) => {
            if connecting && matches!(server.code, 1044 | 1045) {
                return connection(ConnectionErrorKind::Authentication, err);
            }
            let (code, state, message) =
                (server.code, server.state.clone(), server.message.clone());
            Error::Query(QueryError {
                kind: query_kind(code),
                sql: None,
                sqlstate: Some(state),
                code: Some(code),
                message,
                source: Some(Box::new(err)),
            })
        }
        mysql::Error::IoError(ref io) => {
            let kind = io_kind(io, connecting);
            connection(kind, err)
        }
        mysql::Error::DriverError(
            mysql::DriverError::ConnectTimeout | mysql::DriverError::CouldNotConnect(_),
        ) => connection(ConnectionErrorKind::Connect, err),
        other => Error::Protocol(ProtocolError {
            message: other.to_string(),
            source: Some(Box::new(other)),
        }),
    }
}

/// Translate an error raised while opening a connection.
pub fn from_connect(err: mysql::Error) -> Error {
    translate(err, true)
}

/// Translate an error raised on an open connection.
pub fn from_mysql(err: mysql::Error) -> Error {
    translate(err, false)
}
