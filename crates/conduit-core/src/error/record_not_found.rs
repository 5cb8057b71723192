use super::Error;

/// A query that must return a row returned none.
#[derive(Debug)]
pub(super) struct RecordNotFoundError {
    sql: Box<str>,
}

impl std::error::Error for RecordNotFoundError {}

impl core::fmt::Display for RecordNotFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "record not found: {}", self.sql)
    }
}

impl Error {
    /// `sql` is the statement that came back empty.
    pub fn record_not_found(sql: impl Into<String>) -> Error {
        let sql = sql.into().into_boxed_str();
        Error::from(super::ErrorKind::RecordNotFound(RecordNotFoundError { sql }))
    }

    pub fn is_record_not_found(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::RecordNotFound(_))
    }
}
