use conduit_core::Error;
use rusqlite::ErrorCode;

/// Returns `true` if `err` means the database file is unusable rather than
/// the statement being wrong.
pub fn is_connection_failure(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(err, _) => matches!(
            err.code,
            ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull
                | ErrorCode::OutOfMemory
                | ErrorCode::InternalMalfunction
        ),
        _ => false,
    }
}

pub(crate) fn classify(err: rusqlite::Error) -> Error {
    if is_connection_failure(&err) {
        Error::connection_failure(err)
    } else {
        Error::driver_operation_failed(err)
    }
}
