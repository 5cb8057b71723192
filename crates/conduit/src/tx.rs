mod nesting;
use nesting::{Nesting, State};

use crate::{
    db::PoolConnection, savepoint, watchdog::Watchdog, Conn, Context, Db, Error, Result, Row,
    Statement, Value,
};

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// A database transaction.
///
/// Every clone, and every handle returned by [`begin`](Conn::begin) on a
/// transaction, refers to the same backend transaction. Each `begin` must
/// be paired with a [`close`](Conn::close):
///
/// ```no_run
/// # use conduit::{Conn, Db, Result};
/// # async fn example(db: &Db) -> Result<()> {
/// let tx = db.begin().await?;
/// let inner = tx.begin().await?;
/// inner.exec("INSERT INTO users (name) VALUES ('alice')", &[]).await?;
/// inner.commit().await?; // only marks the inner level
/// inner.close().await?;
/// tx.commit().await?; // commits on the database
/// tx.close().await?;
/// # Ok(())
/// # }
/// ```
///
/// A rollback at any level rolls back the backend transaction, and every
/// enclosing level fails from then on. A transaction dropped while still
/// open on the database is rolled back in the background.
#[derive(Clone)]
pub struct Tx {
    inner: Arc<TxInner>,
}

struct TxInner {
    db: Db,
    state: Mutex<TxState>,

    /// Mirrors `Nesting::is_rolled_back` for lock-free reads.
    rolled_back: AtomicBool,

    context: OnceLock<Context>,

    /// Skip the outermost commit and always roll back on close.
    rollback_only: bool,
}

struct TxState {
    /// `None` once the backend transaction finished.
    connection: Option<PoolConnection>,
    nesting: Nesting,
    watchdog: Option<Watchdog>,
}

impl TxState {
    fn connection(&mut self) -> Result<&mut PoolConnection> {
        self.connection.as_mut().ok_or_else(Error::already_committed)
    }
}

impl Tx {
    pub(crate) fn new(
        db: Db,
        connection: PoolConnection,
        context: Option<Context>,
        watchdog: Option<Watchdog>,
        rollback_only: bool,
    ) -> Tx {
        Tx {
            inner: Arc::new(TxInner {
                db,
                state: Mutex::new(TxState {
                    connection: Some(connection),
                    nesting: Nesting::default(),
                    watchdog,
                }),
                rolled_back: AtomicBool::new(false),
                context: context.map(OnceLock::from).unwrap_or_default(),
                rollback_only,
            }),
        }
    }

    /// The pool this transaction was started on.
    pub fn db(&self) -> &Db {
        &self.inner.db
    }

    /// Current nesting depth; 0 is the outermost level.
    pub async fn depth(&self) -> usize {
        self.inner.state.lock().await.nesting.depth()
    }

    /// Returns `true` while the transaction is still open on the database.
    pub async fn is_active(&self) -> bool {
        self.inner.state.lock().await.connection.is_some()
    }

    async fn enter(&self, cx: Option<&Context>) -> Result<Tx> {
        let mut state = self.inner.state.lock().await;

        if state.nesting.is_rolled_back() {
            return Err(Error::rolled_back());
        }

        if cx.is_some_and(Context::is_done) {
            return Err(Error::bad_context());
        }

        if self.is_committed(&state) {
            return Err(Error::already_committed());
        }

        if let Some(cx) = cx {
            match self.inner.context.get() {
                Some(bound) if bound != cx => return Err(Error::context_mismatch()),
                Some(_) => {}
                None => {
                    let _ = self.inner.context.set(cx.clone());
                }
            }
        }

        state.nesting.push();
        Ok(self.clone())
    }

    /// Returns `true` once the outermost level committed. A rollback-only
    /// transaction keeps its connection until close.
    fn is_committed(&self, state: &TxState) -> bool {
        state.connection.is_none()
            || (self.inner.rollback_only
                && state.nesting.is_outermost()
                && state.nesting.current() == State::Committed)
    }

    /// Locks the state for a statement, failing if the current level may
    /// not run one.
    async fn statement_state(&self) -> Result<MutexGuard<'_, TxState>> {
        let state = self.inner.state.lock().await;
        state.nesting.check_statement()?;
        Ok(state)
    }

    /// Runs a backend call under the bound context and reports connection
    /// failures.
    async fn run<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let result = match self.inner.context.get() {
            Some(cx) => cx.run(fut).await,
            None => fut.await,
        };
        self.inner.db.check(result)
    }

    /// Rolls back the backend transaction and marks every level rolled back.
    async fn abort(&self, state: &mut TxState) -> Result<()> {
        let result = match state.connection.take() {
            Some(mut connection) => {
                let result = connection.rollback().await;
                if result.is_err() {
                    connection.discard();
                }
                result
            }
            None => Ok(()),
        };

        state.watchdog = None;
        state.nesting.mark_rolled_back();
        self.inner.rolled_back.store(true, Ordering::Release);
        self.inner.db.pool().trim_idle();

        debug!(db = %self.name(), "rollback");
        self.inner.db.check(result)
    }
}

impl Conn for Tx {
    fn name(&self) -> &str {
        self.inner.db.name()
    }

    fn context(&self) -> Option<&Context> {
        self.inner.context.get()
    }

    #[track_caller]
    fn begin(&self) -> impl Future<Output = Result<Tx>> + Send {
        self.enter(None)
    }

    #[track_caller]
    fn begin_with_context(&self, cx: &Context) -> impl Future<Output = Result<Tx>> + Send {
        let cx = cx.clone();
        async move { self.enter(Some(&cx)).await }
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut state = self.statement_state().await?;
        let connection = state.connection()?;
        self.run(connection.exec(sql, params)).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut state = self.statement_state().await?;
        let connection = state.connection()?;
        self.run(connection.query(sql, params)).await
    }

    async fn prepare(&self, sql: &str) -> Result<Statement> {
        let mut state = self.statement_state().await?;
        let connection = state.connection()?;
        self.run(connection.prepare(sql)).await
    }

    async fn commit(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        state.nesting.check_commit()?;

        if state.nesting.is_outermost() {
            if self.inner.rollback_only {
                // Keep the connection so close rolls back
                state.nesting.mark_committed();
                return Ok(());
            }

            let connection = state.connection()?;
            self.inner.db.check(connection.commit().await)?;

            state.connection = None;
            state.watchdog = None;
            self.inner.db.pool().trim_idle();
            debug!(db = %self.name(), "commit");
        }

        state.nesting.mark_committed();
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if state.nesting.is_rolled_back() {
            return Ok(());
        }

        if state.nesting.current() == State::Committed {
            return Err(Error::already_committed());
        }

        self.abort(&mut state).await
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        let discard_commit = self.inner.rollback_only
            && state.nesting.is_outermost()
            && state.connection.is_some();

        if state.nesting.is_finished() && !discard_commit {
            state.nesting.pop();
            return Ok(());
        }

        self.abort(&mut state).await
    }

    fn is_rolled_back(&self) -> bool {
        self.inner.rolled_back.load(Ordering::Acquire)
    }

    async fn savepoint(&self) -> Result<String> {
        let id = savepoint::generate_savepoint_id();
        self.exec(&savepoint::create(&id)?, &[]).await?;
        Ok(id)
    }

    async fn rollback_to(&self, id: &str) -> Result<()> {
        self.exec(&savepoint::rollback_to(id)?, &[]).await?;
        Ok(())
    }

    async fn release_savepoint(&self, id: &str) -> Result<()> {
        self.exec(&savepoint::release(id)?, &[]).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Tx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("db", &self.inner.db)
            .field("rolled_back", &self.is_rolled_back())
            .field("context", &self.inner.context.get())
            .finish()
    }
}

impl Drop for TxInner {
    fn drop(&mut self) {
        let Some(connection) = self.state.get_mut().connection.take() else {
            return;
        };

        warn!(
            db = %self.db.name(),
            "transaction dropped without commit or rollback; rolling back"
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let mut connection = connection;
                    if connection.rollback().await.is_err() {
                        connection.discard();
                    }
                });
            }
            // Never hand an open transaction back to the pool
            Err(_) => connection.discard(),
        }
    }
}
