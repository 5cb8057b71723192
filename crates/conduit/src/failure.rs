use crate::{Conn, Db, Error};

use std::sync::Arc;

/// Callback invoked with the owning [`Db`] whenever an operation fails with
/// a connection failure. Runs synchronously on the failing task.
pub type FailureFn = Arc<dyn Fn(&Db, &Error) + Send + Sync>;

/// Returns `true` if `err` means the connection or the database server is
/// unusable, as opposed to a problem with the statement.
pub fn is_connection_failure(err: &Error) -> bool {
    err.is_connection_failure()
}

/// A failure callback that panics.
pub fn panic_on_failure() -> FailureFn {
    Arc::new(|db: &Db, err: &Error| panic!("connection failure on {}: {err}", db.name()))
}

/// A failure callback that logs the error and exits the process with
/// status 1, for services that rely on a supervisor to restart them.
pub fn exit_on_failure() -> FailureFn {
    Arc::new(|db: &Db, err: &Error| {
        tracing::error!(db = %db.name(), error = %err, "connection failure; exiting");
        std::process::exit(1);
    })
}
