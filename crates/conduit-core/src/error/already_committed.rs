use super::Error;

#[derive(Debug)]
pub(super) struct AlreadyCommitted;

impl std::error::Error for AlreadyCommitted {}

impl core::fmt::Display for AlreadyCommitted {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("transaction already committed")
    }
}

impl Error {
    /// The transaction level was already committed. Returned for a second
    /// commit, a rollback after commit, and any statement issued after the
    /// commit.
    pub fn already_committed() -> Error {
        Error::from(super::ErrorKind::AlreadyCommitted(AlreadyCommitted))
    }

    pub fn is_already_committed(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::AlreadyCommitted(_))
    }
}
