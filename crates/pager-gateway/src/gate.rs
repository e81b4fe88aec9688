use crate::{client::Pager, event::PagerEvent};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// ConnectivityGate verifies that PagerDuty is reachable before
/// notifications are admitted for delivery.
pub struct ConnectivityGate<'p, P> {
    pager: &'p P,
    retry_interval: Duration,
}

impl<'p, P: Pager> ConnectivityGate<'p, P> {
    pub fn new(pager: &'p P, retry_interval: Duration) -> Self {
        Self {
            pager,
            retry_interval,
        }
    }

    /// Submit a no-op event, returning whether PagerDuty accepted it.
    pub async fn verify(&self) -> bool {
        self.pager.submit_event(&PagerEvent::noop()).await
    }

    /// Verify connectivity until it succeeds, sleeping between attempts.
    /// Returns false if `cancel` was signaled before connectivity was verified.
    pub async fn await_connectivity(&self, cancel: &CancellationToken) -> bool {
        for attempt in 1u64.. {
            if self.verify().await {
                tracing::info!(attempt, "verified connectivity with PagerDuty");
                return true;
            }
            tracing::warn!(
                attempt,
                retry_in = ?self.retry_interval,
                "cannot reach PagerDuty, delaying delivery of notifications"
            );

            tokio::select! {
                _ = cancel.cancelled() => break,
                () = tokio::time::sleep(self.retry_interval) => (),
            }
        }
        false
    }
}
