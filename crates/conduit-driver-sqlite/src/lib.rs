mod error;
pub use error::is_connection_failure;

mod value;
use value::Value;

use conduit_core::{
    async_trait,
    driver::{Driver, Statement},
    Error, Result, Row,
};
use rusqlite::Connection as RusqliteConnection;
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use url::Url;

/// How long a connection waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Creates a SQLite driver from a data source: a `sqlite:` URL, a file
    /// path, or `:memory:`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();

        if url_str.is_empty() {
            return Err(Error::invalid_connection_url("empty SQLite data source"));
        }

        if url_str == ":memory:" {
            return Ok(Self::InMemory);
        }

        let url = match Url::parse(&url_str) {
            Ok(url) => url,
            // Not a URL, so a plain path
            Err(_) => return Ok(Self::File(PathBuf::from(url_str))),
        };

        if url.scheme() != "sqlite" {
            // Windows drive letters parse as one-letter schemes
            if url.scheme().len() == 1 {
                return Ok(Self::File(PathBuf::from(url_str)));
            }

            return Err(Error::invalid_connection_url(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else if url.path().is_empty() {
            Err(Error::invalid_connection_url(format!(
                "no database path in connection URL; url={url_str}"
            )))
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    async fn connect(&self) -> Result<Box<dyn conduit_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }

    fn max_connections(&self) -> Option<usize> {
        // Every in-memory connection is a separate database
        matches!(self, Self::InMemory).then_some(1)
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection = RusqliteConnection::open_in_memory().map_err(error::classify)?;
        Ok(Self { connection })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(error::classify)?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(error::classify)?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl conduit_core::Connection for Connection {
    async fn exec(&mut self, sql: &str, params: &[conduit_core::Value]) -> Result<u64> {
        let mut stmt = self
            .connection
            .prepare_cached(sql)
            .map_err(error::classify)?;
        let params = rusqlite::params_from_iter(params.iter().map(Value));

        if stmt.column_count() > 0 {
            // Rows are discarded; run the statement to completion
            let mut rows = stmt.query(params).map_err(error::classify)?;
            while rows.next().map_err(error::classify)?.is_some() {}
            return Ok(0);
        }

        let count = stmt.execute(params).map_err(error::classify)?;
        Ok(count as u64)
    }

    async fn query(&mut self, sql: &str, params: &[conduit_core::Value]) -> Result<Vec<Row>> {
        let mut stmt = self
            .connection
            .prepare_cached(sql)
            .map_err(error::classify)?;

        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter().map(Value)))
            .map_err(error::classify)?;

        let mut ret = vec![];

        while let Some(row) = rows.next().map_err(error::classify)? {
            let values = (0..columns.len())
                .map(|index| value::load(row, index))
                .collect::<Result<Vec<_>>>()?;
            ret.push(Row::new(columns.clone(), values));
        }

        Ok(ret)
    }

    async fn prepare(&mut self, sql: &str) -> Result<Statement> {
        let stmt = self
            .connection
            .prepare_cached(sql)
            .map_err(error::classify)?;

        Ok(Statement::new(
            sql,
            stmt.parameter_count(),
            stmt.column_names().into_iter().map(String::from).collect(),
        ))
    }

    async fn begin(&mut self) -> Result<()> {
        self.connection
            .execute_batch("BEGIN")
            .map_err(error::classify)
    }

    async fn commit(&mut self) -> Result<()> {
        self.connection
            .execute_batch("COMMIT")
            .map_err(error::classify)
    }

    async fn rollback(&mut self) -> Result<()> {
        self.connection
            .execute_batch("ROLLBACK")
            .map_err(error::classify)
    }

    async fn ping(&mut self) -> Result<()> {
        self.connection
            .query_row("SELECT 1", [], |_| Ok(()))
            .map_err(error::classify)
    }
}
