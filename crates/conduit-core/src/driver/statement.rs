use std::sync::Arc;

/// A prepared statement handle.
///
/// Holds the SQL text and what the backend reported about it. Running the
/// statement goes through the connection with the same SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: Arc<str>,
    params: usize,
    columns: Arc<[String]>,
}

impl Statement {
    pub fn new(sql: impl Into<Arc<str>>, params: usize, columns: Vec<String>) -> Statement {
        Statement {
            sql: sql.into(),
            params,
            columns: columns.into(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of bind parameters the statement expects.
    pub fn params(&self) -> usize {
        self.params
    }

    /// Names of the result columns; empty for statements returning no rows.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}
