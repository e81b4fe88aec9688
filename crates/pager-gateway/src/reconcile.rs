use crate::checks::FailingCheck;
use crate::client::{acknowledgement_window, AcknowledgedBy, AcknowledgementMatch, Pager};
use crate::lease::{Acquisition, LeaseManager};
use crate::store::{CheckDirectory, LeaseStore, Queue};
use crate::GatewayConfig;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// AcknowledgementCommand is pushed onto the platform's events queue to
/// acknowledge a check, suppressing its alerts for `duration` seconds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AcknowledgementCommand {
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    pub entity: String,
    pub check: String,
    pub summary: String,
    pub duration: u64,
    pub time: i64,
}

impl AcknowledgementCommand {
    pub fn new(
        check: &FailingCheck,
        acknowledged_by: &AcknowledgedBy,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: "action".to_string(),
            state: "acknowledgement".to_string(),
            entity: check.entity.clone(),
            check: check.check.clone(),
            summary: format!("Acknowledged on PagerDuty by {}", acknowledged_by.name),
            duration: duration.as_secs(),
            time: now.timestamp(),
        }
    }
}

/// CycleStats summarize a completed reconciliation cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub scanned: usize,
    pub in_maintenance: usize,
    pub acknowledged: usize,
}

/// AckFinder is the acknowledgement-reconciliation loop. On each cycle it
/// looks up PagerDuty incidents of failing checks which were acknowledged
/// there, and acknowledges those checks within the platform.
///
/// Cycles are serialized across processes by a lease, so that each
/// acknowledgement is found by a single process.
pub struct AckFinder<L: LeaseStore + Clone, C, Q, P> {
    leases: LeaseManager<L>,
    checks: C,
    queue: Q,
    pager: P,

    lease_key: String,
    lease_ttl: Duration,
    events_queue: String,
    interval: Duration,
    ack_duration: Duration,
    lookback: Duration,
    lookahead: Duration,
}

impl<L, C, Q, P> AckFinder<L, C, Q, P>
where
    L: LeaseStore + Clone,
    C: CheckDirectory,
    Q: Queue,
    P: Pager,
{
    pub fn new(config: &GatewayConfig, leases: L, checks: C, queue: Q, pager: P) -> Self {
        Self {
            leases: LeaseManager::new(leases),
            checks,
            queue,
            pager,
            lease_key: config.lease_key.clone(),
            lease_ttl: config.lease_ttl,
            events_queue: config.events_queue.clone(),
            interval: config.reconcile_interval,
            ack_duration: config.ack_duration,
            lookback: config.lookback,
            lookahead: config.lookahead,
        }
    }

    /// Run reconciliation cycles separated by the reconciliation interval,
    /// until `cancel` is signaled.
    ///
    /// The lease is released once at startup, clearing a lease left behind
    /// by a prior run of this process which exited mid-cycle.
    pub async fn serve(&self, cancel: &CancellationToken) {
        tracing::info!(interval = ?self.interval, "ack finder started");
        self.leases.release(&self.lease_key).await;

        loop {
            self.run_cycle(cancel).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => (),
            }
        }
        tracing::info!("ack finder stopped");
    }

    /// Run a single reconciliation cycle, returning its stats,
    /// or None if the cycle's lease is held by another process.
    #[tracing::instrument(skip_all, fields(lease = %self.lease_key))]
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Option<CycleStats> {
        let guard = match self.leases.acquire_scoped(&self.lease_key, self.lease_ttl).await {
            Acquisition::Acquired(guard) => guard,
            Acquisition::Contended => {
                tracing::debug!("reconciliation lease is held elsewhere, skipping cycle");
                return None;
            }
        };

        let stats = self.reconcile(cancel).await;
        guard.release().await;

        tracing::info!(
            scanned = stats.scanned,
            in_maintenance = stats.in_maintenance,
            acknowledged = stats.acknowledged,
            "completed reconciliation cycle"
        );
        Some(stats)
    }

    async fn reconcile(&self, cancel: &CancellationToken) -> CycleStats {
        let mut stats = CycleStats::default();

        let checks = match self.checks.failing_checks().await {
            Ok(checks) => checks,
            Err(err) => {
                tracing::error!(?err, "failed to list failing checks");
                return stats;
            }
        };

        let now = Utc::now();
        let (since, until) = acknowledgement_window(now, self.lookback, self.lookahead);

        for check in &checks {
            if cancel.is_cancelled() {
                tracing::info!(remaining = checks.len() - stats.scanned, "reconciliation cycle cancelled");
                break;
            }
            stats.scanned += 1;

            if check.in_maintenance(now) {
                tracing::debug!(entity = %check.entity, check = %check.check, "check is in maintenance, skipping");
                stats.in_maintenance += 1;
                continue;
            }
            if self.reconcile_check(check, since, until).await {
                stats.acknowledged += 1;
            }
        }
        stats
    }

    /// Find an acknowledgement of `check` through the credentials of its
    /// contacts, returning true if an acknowledgement was pushed.
    async fn reconcile_check(
        &self,
        check: &FailingCheck,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> bool {
        let contacts = match self.checks.contacts(check).await {
            Ok(contacts) => contacts,
            Err(err) => {
                tracing::warn!(?err, entity = %check.entity, check = %check.check, "failed to fetch contacts of check");
                return false;
            }
        };
        if contacts.is_empty() {
            tracing::debug!(entity = %check.entity, check = %check.check, "check has no contacts");
            return false;
        }

        for contact in &contacts {
            let Some(credentials) = &contact.credentials else {
                tracing::debug!(contact = %contact.id, check = %check.check, "contact has no PagerDuty credentials");
                continue;
            };
            if let Err(err) = credentials.usable() {
                tracing::debug!(contact = %contact.id, check = %check.check, %err, "contact has unusable PagerDuty credentials");
                continue;
            }

            // Incidents are keyed on the bare check name.
            let Some(AcknowledgementMatch { acknowledged_by, .. }) = self
                .pager
                .query_acknowledgement(credentials, &check.check, since, until)
                .await
            else {
                continue;
            };

            let command =
                AcknowledgementCommand::new(check, &acknowledged_by, self.ack_duration, Utc::now());
            return self.push_command(&command).await;
        }
        false
    }

    async fn push_command(&self, command: &AcknowledgementCommand) -> bool {
        let body = match serde_json::value::to_raw_value(command) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(%err, "failed to encode acknowledgement command");
                return false;
            }
        };

        match self.queue.push(&self.events_queue, body).await {
            Ok(()) => {
                tracing::info!(
                    entity = %command.entity,
                    check = %command.check,
                    summary = %command.summary,
                    "acknowledged check which was acknowledged on PagerDuty"
                );
                true
            }
            Err(err) => {
                tracing::error!(?err, entity = %command.entity, check = %command.check, "failed to push acknowledgement command");
                false
            }
        }
    }
}
