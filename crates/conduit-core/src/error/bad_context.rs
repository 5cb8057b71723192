use super::Error;

#[derive(Debug)]
pub(super) struct BadContext;

impl std::error::Error for BadContext {}

impl core::fmt::Display for BadContext {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("context is already cancelled or past its deadline")
    }
}

impl Error {
    /// A transaction was asked to bind a context that can no longer run
    /// anything.
    pub fn bad_context() -> Error {
        Error::from(super::ErrorKind::BadContext(BadContext))
    }

    pub fn is_bad_context(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::BadContext(_))
    }
}
