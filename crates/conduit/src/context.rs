use crate::{Error, Result};

use by_address::ByAddress;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline scope for database work.
///
/// Clones share the same scope and compare equal. Two contexts created
/// separately never compare equal, even with the same deadline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    inner: ByAddress<Arc<ContextInner>>,
}

#[derive(Debug)]
struct ContextInner {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is only done once [`cancel`](Self::cancel) is called.
    pub fn new() -> Context {
        Context::build(None)
    }

    pub fn with_timeout(timeout: Duration) -> Context {
        Context::build(Some(Instant::now() + timeout))
    }

    pub fn with_deadline(deadline: Instant) -> Context {
        Context::build(Some(deadline))
    }

    fn build(deadline: Option<Instant>) -> Context {
        Context {
            inner: ByAddress(Arc::new(ContextInner {
                token: CancellationToken::new(),
                deadline,
            })),
        }
    }

    /// Cancels the context and every clone of it. In-flight operations
    /// running under it fail with a cancellation error.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns `true` once the context is cancelled or its deadline passed.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline().is_some_and(|d| Instant::now() >= d)
    }

    /// Runs `fut` until it completes or the context is done, whichever
    /// happens first.
    pub(crate) async fn run<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let deadline = async {
            match self.inner.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.inner.token.cancelled() => Err(Error::cancelled()),
            _ = deadline => Err(Error::deadline_exceeded()),
            res = fut => res,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
