use super::Error;

#[derive(Debug)]
pub(super) struct ContextMismatch;

impl std::error::Error for ContextMismatch {}

impl core::fmt::Display for ContextMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("context mismatch")
    }
}

impl Error {
    /// A nested begin supplied a context different from the one already
    /// bound to the transaction.
    pub fn context_mismatch() -> Error {
        Error::from(super::ErrorKind::ContextMismatch(ContextMismatch))
    }

    pub fn is_context_mismatch(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ContextMismatch(_))
    }
}
