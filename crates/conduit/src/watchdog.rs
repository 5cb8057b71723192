use std::{
    panic::Location,
    sync::{PoisonError, RwLock},
    time::Duration,
};
use tokio_util::task::AbortOnDropHandle;

/// What happens when a transaction outlives the configured timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Log an error event naming where the transaction was started.
    Report,

    /// Log the event, then abort the process.
    Abort,
}

#[derive(Debug, Clone, Copy)]
struct Settings {
    enabled: bool,
    duration: Duration,
    policy: Policy,
}

static SETTINGS: RwLock<Settings> = RwLock::new(Settings {
    enabled: false,
    duration: Duration::ZERO,
    policy: Policy::Report,
});

fn settings() -> Settings {
    *SETTINGS.read().unwrap_or_else(PoisonError::into_inner)
}

/// Reports every transaction that stays open longer than `duration`.
///
/// Applies to transactions begun after the call. A zero `duration` leaves
/// the current setting unchanged.
pub fn enable_timeouts(duration: Duration, policy: Policy) {
    if duration.is_zero() {
        return;
    }

    *SETTINGS.write().unwrap_or_else(PoisonError::into_inner) = Settings {
        enabled: true,
        duration,
        policy,
    };
}

/// Stops reporting long-lived transactions, including ones already armed.
pub fn disable_timeouts() {
    SETTINGS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .enabled = false;
}

/// Timer armed for the lifetime of one backend transaction. Dropping it
/// disarms the timer.
#[derive(Debug)]
pub(crate) struct Watchdog {
    _task: AbortOnDropHandle<()>,
}

impl Watchdog {
    pub(crate) fn arm(location: &'static Location<'static>) -> Option<Watchdog> {
        let Settings {
            enabled, duration, ..
        } = settings();

        if !enabled {
            return None;
        }

        let handle = tokio::runtime::Handle::try_current().ok()?;
        let task = handle.spawn(async move {
            tokio::time::sleep(duration).await;

            // Timeouts may have been switched off while we slept
            let settings = settings();
            if !settings.enabled {
                return;
            }

            tracing::error!(
                "transaction lifetime exceeded timeout ({}:{})",
                location.file(),
                location.line()
            );

            if settings.policy == Policy::Abort {
                std::process::abort();
            }
        });

        Some(Watchdog {
            _task: AbortOnDropHandle::new(task),
        })
    }
}
