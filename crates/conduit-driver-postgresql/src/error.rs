use conduit_core::{sqlstate, Error};
use std::error::Error as _;

/// Returns `true` if `err` means the session or the server is unusable: a
/// closed client, an I/O failure, or a server error in one of the
/// connection-level SQLSTATE classes.
pub fn is_connection_failure(err: &tokio_postgres::Error) -> bool {
    if err.is_closed() {
        return true;
    }

    if let Some(code) = err.code() {
        return sqlstate::is_connection_failure_code(code.code());
    }

    let mut source = err.source();
    while let Some(err) = source {
        if err.is::<std::io::Error>() {
            return true;
        }
        source = err.source();
    }

    false
}

pub(crate) fn classify(err: tokio_postgres::Error) -> Error {
    if is_connection_failure(&err) {
        Error::connection_failure(err)
    } else {
        Error::driver_operation_failed(err)
    }
}
