use super::Error;

/// The data source handed to a driver could not be understood: a malformed
/// URL, the wrong scheme, or a missing database path.
#[derive(Debug)]
pub(super) struct InvalidConnectionUrl {
    reason: Box<str>,
}

impl std::error::Error for InvalidConnectionUrl {}

impl core::fmt::Display for InvalidConnectionUrl {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("invalid connection URL: ")?;
        f.write_str(&self.reason)
    }
}

impl Error {
    pub fn invalid_connection_url(reason: impl Into<String>) -> Error {
        let reason = reason.into().into_boxed_str();
        Error::from(super::ErrorKind::InvalidConnectionUrl(InvalidConnectionUrl { reason }))
    }

    /// Returns `true` if a driver rejected its data source.
    pub fn is_invalid_connection_url(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidConnectionUrl(_))
    }
}
