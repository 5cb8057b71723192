mod statement;
pub use statement::Statement;

use crate::{async_trait, Result, Row, Value};

use std::{borrow::Cow, fmt::Debug};

/// A database backend that can open connections.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Returns the URL this driver connects to.
    fn url(&self) -> Cow<'_, str>;

    /// Opens a new connection to the database.
    async fn connect(&self) -> Result<Box<dyn Connection>>;

    /// Upper bound on concurrently open connections, if the backend imposes
    /// one. In-memory SQLite, for example, only supports a single connection.
    fn max_connections(&self) -> Option<usize> {
        None
    }
}

/// A single open session with the database.
///
/// Errors that mean the session itself is unusable must be built with
/// [`Error::connection_failure`](crate::Error::connection_failure) so callers
/// can tell them apart from statement errors.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Executes a statement, returning the number of affected rows.
    async fn exec(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Executes a statement and collects all result rows.
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Prepares a statement. Backends that cache prepared statements reuse
    /// them for later `exec` and `query` calls with the same SQL.
    async fn prepare(&mut self, sql: &str) -> Result<Statement>;

    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Verifies the session is alive.
    async fn ping(&mut self) -> Result<()>;
}
