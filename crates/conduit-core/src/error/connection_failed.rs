use std::time::Duration;

use super::Error;

/// The connector gave up waiting for the database to answer.
#[derive(Debug)]
pub(super) struct ConnectionFailed {
    elapsed: Duration,
}

impl std::error::Error for ConnectionFailed {}

impl core::fmt::Display for ConnectionFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "could not connect to database after retrying for {:?}",
            self.elapsed
        )
    }
}

impl Error {
    pub fn connection_failed(elapsed: Duration) -> Error {
        Error::from(super::ErrorKind::ConnectionFailed(ConnectionFailed {
            elapsed,
        }))
    }

    /// Returns `true` if connecting ran out of retry time.
    pub fn is_connection_failed(&self) -> bool {
        self.chain()
            .any(|err| matches!(err.kind(), super::ErrorKind::ConnectionFailed(_)))
    }
}
