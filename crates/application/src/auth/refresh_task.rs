//! Background token refresh loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::session::{RefreshOutcome, SessionManager};

/// Default time between expiry checks.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to the periodic refresh task.
///
/// The task lives until [`RefreshTask::stop`] or [`RefreshTask::shutdown`]
/// is called; dropping the handle leaves it running.
#[derive(Debug)]
pub struct RefreshTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Spawns the loop on the current tokio runtime.
    ///
    /// The first check happens one `interval` after spawning. Ticks missed
    /// while a refresh is running are skipped rather than replayed.
    #[must_use]
    pub fn spawn(manager: Arc<SessionManager>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(manager, interval, cancel.clone()));
        Self { cancel, handle }
    }

    /// Signals the loop to stop. Returns immediately.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            debug!(error = %e, "refresh task ended abnormally");
        }
    }

    /// True once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run(manager: Arc<SessionManager>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_secs = interval.as_secs(), "token refresh loop started");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            () = cancel.cancelled() => break,
            outcome = manager.refresh_tick() => match outcome {
                RefreshOutcome::Refreshed(_) => debug!("token refreshed by background loop"),
                RefreshOutcome::Failed(e) => debug!(error = %e, "background refresh failed, keeping current token"),
                RefreshOutcome::NoToken
                | RefreshOutcome::StillFresh { .. }
                | RefreshOutcome::InFlight => {}
            },
        }
    }

    info!("token refresh loop stopped");
}
