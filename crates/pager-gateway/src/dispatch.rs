use crate::event::render;
use crate::gate::ConnectivityGate;
use crate::notification::Notification;
use crate::store::Queue;
use crate::{client::Pager, GatewayConfig};
use anyhow::Context;
use serde_json::value::RawValue;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Action which stops a Notifier when pushed onto its actions channel.
pub const STOP_ACTION: &str = "stop";
/// Action which wakes an idle Notifier to pop its queue.
pub const WAKE_ACTION: &str = "+";

/// Notifier is the notification-dispatch loop. It delivers notifications
/// from its queue to PagerDuty, once PagerDuty is known to be reachable.
///
/// Delivery is at-most-once: a popped notification which cannot be
/// delivered is dropped, and one popped by a Notifier which then fails
/// is lost. Unpopped notifications remain queued across restarts.
pub struct Notifier<Q, P> {
    queue: Q,
    pager: P,
    queue_key: String,
    actions_key: String,
    actions_wait: Duration,
    connectivity_retry: Duration,
}

impl<Q: Queue, P: Pager> Notifier<Q, P> {
    pub fn new(config: &GatewayConfig, queue: Q, pager: P) -> Self {
        Self {
            queue,
            pager,
            queue_key: config.queue.clone(),
            actions_key: config.actions_queue(),
            actions_wait: config.actions_wait,
            connectivity_retry: config.connectivity_retry,
        }
    }

    /// Serve until `cancel` is signaled or a stop action is received,
    /// returning the number of delivered notifications.
    pub async fn serve(&self, cancel: &CancellationToken) -> u64 {
        tracing::info!(queue = %self.queue_key, "notifier started");

        let gate = ConnectivityGate::new(&self.pager, self.connectivity_retry);
        if !gate.await_connectivity(cancel).await {
            tracing::info!("notifier stopped before PagerDuty connectivity was verified");
            return 0;
        }

        let delivered = self.consume(cancel).await;
        tracing::info!(delivered, "notifier stopped");
        delivered
    }

    async fn consume(&self, cancel: &CancellationToken) -> u64 {
        let mut delivered = 0;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.queue.pop(&self.queue_key).await {
                Ok(Some(item)) => {
                    if self.deliver(&item).await {
                        delivered += 1;
                    }
                    continue; // Drain any backlog without pausing.
                }
                Ok(None) => (),
                Err(err) => {
                    tracing::error!(?err, queue = %self.queue_key, "failed to pop notification (will retry)");
                }
            }

            let action = tokio::select! {
                _ = cancel.cancelled() => break,
                action = self.queue.blocking_pop(&self.actions_key, self.actions_wait) => action,
            };

            match action {
                Ok(Some(action)) if is_stop(&action) => {
                    tracing::info!("notifier received stop action");
                    break;
                }
                Ok(Some(action)) => {
                    tracing::debug!(action = action.get(), "notifier woken by action");
                }
                Ok(None) => (),
                Err(err) => {
                    tracing::error!(?err, actions = %self.actions_key, "failed to await actions (will retry)");

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        () = tokio::time::sleep(self.actions_wait) => (),
                    }
                }
            }
        }
        delivered
    }

    /// Deliver a popped queue `item`, returning whether PagerDuty accepted it.
    #[tracing::instrument(skip_all, fields(entity, check, notification_type))]
    async fn deliver(&self, item: &RawValue) -> bool {
        let notification: Notification = match serde_json::from_str(item.get()) {
            Ok(notification) => notification,
            Err(err) => {
                tracing::warn!(%err, item = item.get(), "dropping notification which failed to decode");
                return false;
            }
        };

        tracing::Span::current()
            .record("entity", notification.entity.as_str())
            .record("check", notification.check.as_str())
            .record("notification_type", tracing::field::debug(notification.kind));

        let event = render(&notification);

        if self.pager.submit_event(&event).await {
            tracing::info!(
                incident_key = %event.incident_key,
                event_type = ?event.event_type,
                contact = ?notification.contact_name(),
                "delivered notification to PagerDuty"
            );
            true
        } else {
            tracing::warn!(
                incident_key = %event.incident_key,
                time = notification.time,
                "PagerDuty did not accept notification, dropping it"
            );
            false
        }
    }
}

fn is_stop(action: &RawValue) -> bool {
    serde_json::from_str::<&str>(action.get()).is_ok_and(|action| action == STOP_ACTION)
}

/// Enqueue `notification` for delivery, and wake an idle Notifier.
pub async fn enqueue<Q: Queue>(
    queue: &Q,
    config: &GatewayConfig,
    notification: &Notification,
) -> anyhow::Result<()> {
    let body = serde_json::value::to_raw_value(notification)
        .context("failed to encode notification")?;

    queue.push(&config.queue, body).await?;
    queue
        .push(&config.actions_queue(), action_body(WAKE_ACTION)?)
        .await
}

/// Ask a Notifier serving `config` to stop.
pub async fn request_stop<Q: Queue>(queue: &Q, config: &GatewayConfig) -> anyhow::Result<()> {
    queue
        .push(&config.actions_queue(), action_body(STOP_ACTION)?)
        .await
}

fn action_body(action: &str) -> anyhow::Result<Box<RawValue>> {
    serde_json::value::to_raw_value(action).context("failed to encode action")
}
