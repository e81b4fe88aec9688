use super::{CheckDirectory, LeaseStore, Queue};
use crate::checks::{Contact, FailingCheck};
use serde_json::value::RawValue;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// MemoryStore is an in-process store, shared by its clones.
/// It backs local runs of the gateway and its tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    pushed: tokio::sync::Notify,
}

#[derive(Debug, Default)]
struct State {
    queues: HashMap<String, VecDeque<Box<RawValue>>>,
    leases: HashMap<String, Lease>,
    checks: Vec<(FailingCheck, Vec<Contact>)>,
}

#[derive(Debug)]
struct Lease {
    value: String,
    expires_at: Option<Instant>,
}

impl Lease {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a failing `check` owned by `contacts`, replacing any
    /// previous listing of the same check.
    pub fn insert_check(&self, check: FailingCheck, contacts: Vec<Contact>) {
        let mut state = self.inner.state.lock().unwrap();
        state
            .checks
            .retain(|(c, _)| (&c.entity, &c.check) != (&check.entity, &check.check));
        state.checks.push((check, contacts));
    }

    /// Number of items held by queue `key`.
    pub fn len(&self, key: &str) -> usize {
        let state = self.inner.state.lock().unwrap();
        state.queues.get(key).map_or(0, VecDeque::len)
    }

    /// Value of the live lease `key`, if there is one.
    pub fn lease(&self, key: &str) -> Option<String> {
        let state = self.inner.state.lock().unwrap();
        state
            .leases
            .get(key)
            .filter(|lease| lease.is_live(Instant::now()))
            .map(|lease| lease.value.clone())
    }

    fn pop_now(&self, key: &str) -> Option<Box<RawValue>> {
        let mut state = self.inner.state.lock().unwrap();
        state.queues.get_mut(key).and_then(VecDeque::pop_front)
    }
}

impl Queue for MemoryStore {
    async fn pop<'s>(&'s self, key: &'s str) -> anyhow::Result<Option<Box<RawValue>>> {
        Ok(self.pop_now(key))
    }

    async fn push<'s>(&'s self, key: &'s str, body: Box<RawValue>) -> anyhow::Result<()> {
        self.inner
            .state
            .lock()
            .unwrap()
            .queues
            .entry(key.to_string())
            .or_default()
            .push_back(body);

        self.inner.pushed.notify_waiters();
        Ok(())
    }

    async fn blocking_pop<'s>(
        &'s self,
        key: &'s str,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Option<Box<RawValue>>> {
        let deadline = Instant::now() + timeout;

        loop {
            // Register for wake-ups before checking the queue,
            // so that a push between the check and the wait isn't missed.
            let notified = self.inner.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.pop_now(key) {
                return Ok(Some(item));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

impl LeaseStore for MemoryStore {
    async fn create_if_absent<'s>(&'s self, key: &'s str, value: &'s str) -> anyhow::Result<bool> {
        let mut state = self.inner.state.lock().unwrap();

        if let Some(lease) = state.leases.get(key) {
            if lease.is_live(Instant::now()) {
                return Ok(false);
            }
        }
        state.leases.insert(
            key.to_string(),
            Lease {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn expire<'s>(&'s self, key: &'s str, ttl: std::time::Duration) -> anyhow::Result<()> {
        let mut state = self.inner.state.lock().unwrap();

        if let Some(lease) = state.leases.get_mut(key) {
            lease.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn delete<'s>(&'s self, key: &'s str) -> anyhow::Result<()> {
        self.inner.state.lock().unwrap().leases.remove(key);
        Ok(())
    }
}

impl CheckDirectory for MemoryStore {
    async fn failing_checks(&self) -> anyhow::Result<Vec<FailingCheck>> {
        let state = self.inner.state.lock().unwrap();

        Ok(state
            .checks
            .iter()
            .map(|(check, _)| check.clone())
            .filter(|check| crate::checks::FAILING_STATES.contains(&check.state.as_str()))
            .collect())
    }

    async fn contacts<'s>(&'s self, check: &'s FailingCheck) -> anyhow::Result<Vec<Contact>> {
        let state = self.inner.state.lock().unwrap();

        Ok(state
            .checks
            .iter()
            .find(|(c, _)| (&c.entity, &c.check) == (&check.entity, &check.check))
            .map(|(_, contacts)| contacts.clone())
            .unwrap_or_default())
    }
}
