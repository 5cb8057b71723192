use super::{connect, pool::PoolConfig, Db, Pool};
use crate::{driver::Driver, Conn, Error, FailureFn, Result};

use backon::{ExponentialBuilder, Retryable};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tracing::instrument;

static MAX_RETRY_TIME_MS: AtomicU64 = AtomicU64::new(15 * 60 * 1000);

/// Sets the process-wide ceiling on how long [`connect`](crate::connect)
/// keeps retrying an unreachable database.
pub fn set_max_retry_time(duration: Duration) {
    let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    MAX_RETRY_TIME_MS.store(ms, Ordering::Relaxed);
}

/// The process-wide connect retry ceiling. Defaults to 15 minutes.
pub fn max_retry_time() -> Duration {
    Duration::from_millis(MAX_RETRY_TIME_MS.load(Ordering::Relaxed))
}

/// Configures and opens a [`Db`].
///
/// ```no_run
/// # use conduit::Conn;
/// # async fn example() -> conduit::Result<()> {
/// let db = conduit::Db::builder()
///     .max_open(16)
///     .max_idle(4)
///     .on_failure(|db, err| eprintln!("{}: {err}", db.name()))
///     .connect("postgres", "postgresql://localhost/app")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Builder {
    pool: PoolConfig,
    max_retry_time: Option<Duration>,
    on_failure: Option<FailureFn>,
}

impl Builder {
    /// Maximum number of open connections. 0 selects a default based on the
    /// number of CPUs.
    pub fn max_open(&mut self, max_open: usize) -> &mut Self {
        self.pool.max_open = max_open;
        self
    }

    /// Maximum number of idle connections kept for reuse. 0 keeps every
    /// connection.
    pub fn max_idle(&mut self, max_idle: usize) -> &mut Self {
        self.pool.max_idle = max_idle;
        self
    }

    /// How long a statement waits for a free connection before failing.
    /// Waits indefinitely when unset.
    pub fn wait_timeout(&mut self, wait_timeout: Duration) -> &mut Self {
        self.pool.wait_timeout = Some(wait_timeout);
        self
    }

    /// Overrides the process-wide connect retry ceiling for this builder.
    pub fn max_retry_time(&mut self, max_retry_time: Duration) -> &mut Self {
        self.max_retry_time = Some(max_retry_time);
        self
    }

    /// Called whenever an operation on the database fails with a connection
    /// failure.
    pub fn on_failure(&mut self, f: impl Fn(&Db, &Error) + Send + Sync + 'static) -> &mut Self {
        self.on_failure = Some(Arc::new(f));
        self
    }

    /// Installs a shared failure callback such as
    /// [`exit_on_failure`](crate::exit_on_failure).
    pub fn on_failure_fn(&mut self, f: FailureFn) -> &mut Self {
        self.on_failure = Some(f);
        self
    }

    /// Opens a pool for the named driver and waits until the database
    /// answers, retrying with exponential backoff up to the retry ceiling.
    ///
    /// Supported drivers are `postgres` (or `postgresql`) and `sqlite` (or
    /// `sqlite3`), each behind the cargo feature of the same name.
    #[instrument(skip_all, fields(driver = name), err)]
    pub async fn connect(&self, name: &str, data_source: &str) -> Result<Db> {
        let driver = connect::driver(name, data_source)?;
        self.connect_boxed(driver).await
    }

    /// Opens a pool without contacting the database. Connection problems
    /// surface on the first statement.
    pub fn connect_unchecked(&self, name: &str, data_source: &str) -> Result<Db> {
        let driver = connect::driver(name, data_source)?;
        self.build(driver)
    }

    /// Like [`connect`](Self::connect), for an already constructed driver.
    #[instrument(skip_all, fields(url = %driver.url()), err)]
    pub async fn connect_driver(&self, driver: impl Driver) -> Result<Db> {
        self.connect_boxed(Box::new(driver)).await
    }

    /// Like [`connect_unchecked`](Self::connect_unchecked), for an already
    /// constructed driver.
    pub fn connect_driver_unchecked(&self, driver: impl Driver) -> Result<Db> {
        self.build(Box::new(driver))
    }

    async fn connect_boxed(&self, driver: Box<dyn Driver>) -> Result<Db> {
        let db = self.build(driver)?;
        let max_retry_time = self.max_retry_time.unwrap_or_else(max_retry_time);

        if let Err(err) = ping_until_ready(&db, max_retry_time).await {
            db.pool().close();
            return Err(err);
        }

        Ok(db)
    }

    fn build(&self, driver: Box<dyn Driver>) -> Result<Db> {
        let pool = Pool::new(driver, &self.pool)?;
        Ok(Db::new(pool, self.on_failure.clone()))
    }
}

async fn ping_until_ready(db: &Db, max_retry_time: Duration) -> Result<()> {
    let retry_policy = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_factor(1.5)
        .with_max_delay(Duration::from_secs(60))
        .with_jitter()
        .with_max_times(usize::MAX);

    let last_error = Mutex::new(None::<Error>);

    let notify_retry = |err: &Error, dur: Duration| {
        tracing::warn!(
            db = %db.name(),
            error = %err,
            "Database not reachable. Retrying in {:.1}s",
            dur.as_secs_f32()
        );
        if let Ok(mut last_error) = last_error.lock() {
            *last_error = Some(err.clone());
        }
    };

    let ping = (|| db.ping_unchecked())
        .retry(retry_policy)
        .when(Error::is_connection_failure)
        .notify(notify_retry);

    match tokio::time::timeout(max_retry_time, ping).await {
        Ok(result) => result,
        Err(_) => {
            let last_error = last_error.lock().ok().and_then(|mut err| err.take());
            let err = Error::connection_failed(max_retry_time);
            Err(match last_error {
                Some(cause) => cause.context(err),
                None => err,
            })
        }
    }
}
