//! Connection pooling for database connections.

use crate::{driver::{Connection, Driver}, Error, Result};

use std::{
    cell::Cell,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

pub use deadpool::Status;

/// Get the default maximum size of a pool, which is `cpu_core_count * 4`.
fn get_default_pool_max_size() -> usize {
    deadpool::managed::PoolConfig::default().max_size
}

/// Limits applied when building a pool.
#[derive(Debug, Clone, Default)]
pub(crate) struct PoolConfig {
    /// Maximum open connections; 0 selects the default size.
    pub(crate) max_open: usize,

    /// Maximum idle connections kept after use; 0 keeps all of them.
    pub(crate) max_idle: usize,

    /// How long a checkout waits for a free connection.
    pub(crate) wait_timeout: Option<Duration>,
}

/// A connection pool that manages database connections.
#[derive(Debug)]
pub(crate) struct Pool {
    inner: deadpool::managed::Pool<Manager>,
    url: String,
    max_connections: Option<usize>,
    max_idle: AtomicUsize,
}

impl Pool {
    /// Creates a new connection pool from the given driver. No connection is
    /// opened until the first checkout.
    pub(crate) fn new(driver: Box<dyn Driver>, config: &PoolConfig) -> Result<Self> {
        let url = driver.url().into_owned();
        let max_connections = driver.max_connections();

        let mut builder = deadpool::managed::Pool::builder(Manager { driver })
            .runtime(deadpool::Runtime::Tokio1)
            .max_size(max_size(config.max_open, max_connections));

        if let Some(wait_timeout) = config.wait_timeout {
            builder = builder.wait_timeout(Some(wait_timeout));
        }

        let inner = builder
            .build()
            .map_err(|err| Error::invalid_driver_configuration(err.to_string()))?;

        Ok(Self {
            inner,
            url,
            max_connections,
            max_idle: AtomicUsize::new(config.max_idle),
        })
    }

    /// Retrieves a connection from the pool.
    pub(crate) async fn get(&self) -> Result<PoolConnection> {
        let connection = self.inner.get().await.map_err(|err| match err {
            deadpool::managed::PoolError::Backend(err) => err,
            err => Error::connection_pool(err),
        })?;
        Ok(PoolConnection { inner: connection })
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn resize(&self, max_open: usize) {
        self.inner.resize(max_size(max_open, self.max_connections));
    }

    pub(crate) fn set_max_idle(&self, max_idle: usize) {
        self.max_idle.store(max_idle, Ordering::Relaxed);
        self.trim_idle();
    }

    /// Closes idle connections above the idle limit.
    pub(crate) fn trim_idle(&self) {
        let max_idle = self.max_idle.load(Ordering::Relaxed);
        if max_idle == 0 {
            return;
        }

        let available = self.inner.status().available;
        if available <= max_idle {
            return;
        }

        let excess = Cell::new(available - max_idle);
        self.inner.retain(|_, _| {
            if excess.get() == 0 {
                return true;
            }
            excess.set(excess.get() - 1);
            false
        });
    }

    pub(crate) fn status(&self) -> Status {
        self.inner.status()
    }

    pub(crate) fn close(&self) {
        self.inner.close();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

fn max_size(max_open: usize, max_connections: Option<usize>) -> usize {
    let max_open = match max_open {
        0 => get_default_pool_max_size(),
        n => n,
    };

    match max_connections {
        Some(max_connections) => max_open.min(max_connections),
        None => max_open,
    }
}

#[derive(Debug)]
struct Manager {
    driver: Box<dyn Driver>,
}

impl deadpool::managed::Manager for Manager {
    type Type = Box<dyn Connection>;
    type Error = Error;

    async fn create(&self) -> Result<Self::Type> {
        self.driver.connect().await
    }

    async fn recycle(
        &self,
        _obj: &mut Self::Type,
        _metrics: &deadpool::managed::Metrics,
    ) -> deadpool::managed::RecycleResult<Self::Error> {
        Ok(())
    }
}

/// A connection retrieved from a pool.
///
/// When dropped, the connection is returned to the pool for reuse.
pub(crate) struct PoolConnection {
    inner: deadpool::managed::Object<Manager>,
}

impl PoolConnection {
    /// Removes the connection from the pool and closes it.
    pub(crate) fn discard(self) {
        drop(deadpool::managed::Object::take(self.inner));
    }

    /// Returns the connection to the pool, or discards it if `result` shows
    /// the connection is broken.
    pub(crate) fn release<T>(self, result: &Result<T>) {
        if matches!(result, Err(err) if err.is_connection_failure()) {
            self.discard();
        }
    }
}

impl std::fmt::Debug for PoolConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PoolConnection").field(&**self.inner).finish()
    }
}

impl Deref for PoolConnection {
    type Target = Box<dyn Connection>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PoolConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
