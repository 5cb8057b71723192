mod builder;
pub use builder::{max_retry_time, set_max_retry_time, Builder};

mod connect;

mod pool;
pub(crate) use pool::{Pool, PoolConnection};
pub use pool::Status;

use crate::{
    savepoint, watchdog::Watchdog, Conn, Context, Error, FailureFn, Result, Row, Statement, Tx,
    Value,
};

use std::{future::Future, panic::Location, sync::Arc};
use tracing::debug;

/// Opens a pool for the named driver, waiting until the database answers.
///
/// `max_open` limits open connections and `max_idle` the connections kept
/// for reuse; 0 leaves either unlimited by this call.
pub async fn connect(name: &str, data_source: &str, max_open: usize, max_idle: usize) -> Result<Db> {
    Db::builder()
        .max_open(max_open)
        .max_idle(max_idle)
        .connect(name, data_source)
        .await
}

/// Opens a pool for the named driver without contacting the database.
pub fn connect_unchecked(
    name: &str,
    data_source: &str,
    max_open: usize,
    max_idle: usize,
) -> Result<Db> {
    Db::builder()
        .max_open(max_open)
        .max_idle(max_idle)
        .connect_unchecked(name, data_source)
}

/// A handle to a connection pool.
///
/// Cloning is cheap and every clone shares the same pool. Statements run
/// on a pooled connection that goes back to the pool as soon as the
/// statement finishes. [`begin`](Conn::begin) starts a transaction that
/// keeps one connection until it finishes.
#[derive(Clone)]
pub struct Db {
    inner: Arc<DbInner>,

    /// Transactions begun through this handle never commit.
    rollback_only: bool,
}

struct DbInner {
    pool: Pool,
    on_failure: Option<FailureFn>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub(crate) fn new(pool: Pool, on_failure: Option<FailureFn>) -> Db {
        Db {
            inner: Arc::new(DbInner { pool, on_failure }),
            rollback_only: false,
        }
    }

    pub(crate) fn pool(&self) -> &Pool {
        &self.inner.pool
    }

    /// Returns a handle to the same pool whose transactions are always
    /// discarded.
    ///
    /// Committing the outermost level of such a transaction is accepted but
    /// never reaches the database, and closing it always rolls back. Code
    /// under test can commit freely while the test still leaves the
    /// database untouched.
    pub fn rollback_only(&self) -> Db {
        Db {
            inner: self.inner.clone(),
            rollback_only: true,
        }
    }

    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    /// Checks that the database answers.
    pub async fn ping(&self) -> Result<()> {
        let result = self.ping_unchecked().await;
        self.check(result)
    }

    /// Ping without running the failure callback; used while connecting.
    pub(crate) async fn ping_unchecked(&self) -> Result<()> {
        let mut connection = self.pool().get().await?;
        let result = connection.ping().await;
        connection.release(&result);
        result
    }

    /// Changes the maximum number of open connections. 0 restores the
    /// default.
    pub fn set_max_open(&self, max_open: usize) {
        self.pool().resize(max_open);
    }

    /// Changes the maximum number of idle connections. 0 keeps every
    /// connection.
    pub fn set_max_idle(&self, max_idle: usize) {
        self.pool().set_max_idle(max_idle);
    }

    pub fn status(&self) -> Status {
        self.pool().status()
    }

    pub fn is_closed(&self) -> bool {
        self.pool().is_closed()
    }

    /// Runs the failure callback if `result` failed because of the
    /// connection.
    pub(crate) fn check<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_connection_failure() {
                if let Some(on_failure) = &self.inner.on_failure {
                    on_failure(self, err);
                }
            }
        }
        result
    }

    async fn begin_tx(&self, context: Option<Context>, location: &'static Location<'static>) -> Result<Tx> {
        let mut connection = self.check(self.pool().get().await)?;

        let result = match &context {
            Some(cx) => cx.run(connection.begin()).await,
            None => connection.begin().await,
        };

        if let Err(err) = result {
            // The session state is unknown
            connection.discard();
            return self.check(Err(err));
        }

        debug!(db = %self.name(), "begin");
        Ok(Tx::new(
            self.clone(),
            connection,
            context,
            Watchdog::arm(location),
            self.rollback_only,
        ))
    }
}

impl Conn for Db {
    fn name(&self) -> &str {
        self.pool().url()
    }

    fn context(&self) -> Option<&Context> {
        None
    }

    #[track_caller]
    fn begin(&self) -> impl Future<Output = Result<Tx>> + Send {
        let location = Location::caller();
        async move { self.begin_tx(None, location).await }
    }

    #[track_caller]
    fn begin_with_context(&self, cx: &Context) -> impl Future<Output = Result<Tx>> + Send {
        let location = Location::caller();
        let cx = cx.clone();
        async move {
            if cx.is_done() {
                return Err(Error::bad_context());
            }
            self.begin_tx(Some(cx), location).await
        }
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let result = async {
            let mut connection = self.pool().get().await?;
            let result = connection.exec(sql, params).await;
            connection.release(&result);
            result
        }
        .await;
        self.pool().trim_idle();
        self.check(result)
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let result = async {
            let mut connection = self.pool().get().await?;
            let result = connection.query(sql, params).await;
            connection.release(&result);
            result
        }
        .await;
        self.pool().trim_idle();
        self.check(result)
    }

    async fn prepare(&self, sql: &str) -> Result<Statement> {
        let result = async {
            let mut connection = self.pool().get().await?;
            let result = connection.prepare(sql).await;
            connection.release(&result);
            result
        }
        .await;
        self.pool().trim_idle();
        self.check(result)
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        Ok(())
    }

    /// Closes the pool. Statements issued afterwards fail.
    async fn close(&self) -> Result<()> {
        self.pool().close();
        Ok(())
    }

    fn is_rolled_back(&self) -> bool {
        false
    }

    async fn savepoint(&self) -> Result<String> {
        Ok(savepoint::generate_savepoint_id())
    }

    async fn rollback_to(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn release_savepoint(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("name", &self.name())
            .field("rollback_only", &self.rollback_only)
            .finish()
    }
}
