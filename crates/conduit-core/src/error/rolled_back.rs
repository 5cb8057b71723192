use super::Error;

#[derive(Debug)]
pub(super) struct RolledBack;

impl std::error::Error for RolledBack {}

impl core::fmt::Display for RolledBack {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "transaction rolled back")
    }
}

impl Error {
    /// The transaction was rolled back, at this or any other nesting level.
    pub fn rolled_back() -> Error {
        Error::from(super::ErrorKind::RolledBack(RolledBack))
    }

    /// Returns `true` if this error reports an operation on a rolled back
    /// transaction.
    pub fn is_rolled_back(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::RolledBack(_))
    }
}
