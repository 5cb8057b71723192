use super::Error;

/// Error when the connector is asked for a driver it cannot provide.
///
/// This occurs when:
/// - the driver name is not recognized
/// - the driver is recognized but its cargo feature is not enabled
#[derive(Debug)]
pub(super) struct InvalidDriverConfiguration {
    message: Box<str>,
}

impl std::error::Error for InvalidDriverConfiguration {}

impl core::fmt::Display for InvalidDriverConfiguration {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid driver configuration: {}", self.message)
    }
}

impl Error {
    pub fn invalid_driver_configuration(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidDriverConfiguration(
            InvalidDriverConfiguration {
                message: message.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is an invalid driver configuration error.
    pub fn is_invalid_driver_configuration(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidDriverConfiguration(_))
    }
}
