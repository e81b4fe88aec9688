//! Recording fakes of the gateway's collaborators, which append each call
//! they receive to a shared Log so tests may assert on call sequences.

use crate::checks::{Contact, FailingCheck};
use crate::client::{AcknowledgedBy, AcknowledgementMatch, Credentials, Pager};
use crate::event::PagerEvent;
use crate::store::{CheckDirectory, LeaseStore, Queue};
use chrono::{DateTime, Utc};
use serde_json::value::RawValue;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

pub fn raw(s: &str) -> Box<RawValue> {
    RawValue::from_string(s.to_string()).unwrap()
}

/// RecordingQueue returns scripted items from `pop` and `blocking_pop`.
/// Once a key's script is exhausted, `pop` returns None and `blocking_pop`
/// waits out its timeout before returning None.
#[derive(Debug, Clone)]
pub struct RecordingQueue {
    log: Log,
    scripts: Arc<Mutex<HashMap<String, VecDeque<Option<Box<RawValue>>>>>>,
    pushed: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingQueue {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            scripts: Default::default(),
            pushed: Default::default(),
        }
    }

    pub fn script(self, key: &str, items: Vec<Option<&str>>) -> Self {
        self.scripts.lock().unwrap().entry(key.to_string()).or_default().extend(
            items.into_iter().map(|item| item.map(raw)),
        );
        self
    }

    pub fn pushed(&self) -> Vec<(String, String)> {
        self.pushed.lock().unwrap().clone()
    }

    fn next(&self, key: &str) -> Option<Box<RawValue>> {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(VecDeque::pop_front)
            .flatten()
    }
}

impl Queue for RecordingQueue {
    async fn pop<'s>(&'s self, key: &'s str) -> anyhow::Result<Option<Box<RawValue>>> {
        self.log.push(format!("pop {key}"));
        Ok(self.next(key))
    }

    async fn push<'s>(&'s self, key: &'s str, body: Box<RawValue>) -> anyhow::Result<()> {
        self.log.push(format!("push {key}"));
        self.pushed
            .lock()
            .unwrap()
            .push((key.to_string(), body.get().to_string()));
        Ok(())
    }

    async fn blocking_pop<'s>(
        &'s self,
        key: &'s str,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Option<Box<RawValue>>> {
        self.log.push(format!("blocking_pop {key}"));

        let exhausted = self
            .scripts
            .lock()
            .unwrap()
            .get(key)
            .map_or(true, VecDeque::is_empty);

        if exhausted {
            tokio::time::sleep(timeout).await;
            return Ok(None);
        }
        Ok(self.next(key))
    }
}

/// RecordingLeases returns scripted results from `create_if_absent`,
/// defaulting to `false` once exhausted.
#[derive(Debug, Clone)]
pub struct RecordingLeases {
    log: Log,
    acquires: Arc<Mutex<VecDeque<bool>>>,
    fail: bool,
}

impl RecordingLeases {
    pub fn new(log: &Log, acquires: Vec<bool>) -> Self {
        Self {
            log: log.clone(),
            acquires: Arc::new(Mutex::new(acquires.into())),
            fail: false,
        }
    }

    pub fn failing(log: &Log) -> Self {
        Self {
            fail: true,
            ..Self::new(log, Vec::new())
        }
    }

    fn result<T>(&self, ok: T) -> anyhow::Result<T> {
        if self.fail {
            anyhow::bail!("lease store is unavailable")
        }
        Ok(ok)
    }
}

impl LeaseStore for RecordingLeases {
    async fn create_if_absent<'s>(&'s self, key: &'s str, _value: &'s str) -> anyhow::Result<bool> {
        self.log.push(format!("create_if_absent {key}"));
        let created = self.acquires.lock().unwrap().pop_front().unwrap_or(false);
        self.result(created)
    }

    async fn expire<'s>(&'s self, key: &'s str, ttl: std::time::Duration) -> anyhow::Result<()> {
        self.log.push(format!("expire {key} {}s", ttl.as_secs()));
        self.result(())
    }

    async fn delete<'s>(&'s self, key: &'s str) -> anyhow::Result<()> {
        self.log.push(format!("delete {key}"));
        self.result(())
    }
}

/// RecordingChecks lists fixed failing checks and their contacts.
#[derive(Debug, Clone)]
pub struct RecordingChecks {
    log: Log,
    checks: Arc<Vec<(FailingCheck, Vec<Contact>)>>,
}

impl RecordingChecks {
    pub fn new(log: &Log, checks: Vec<(FailingCheck, Vec<Contact>)>) -> Self {
        Self {
            log: log.clone(),
            checks: Arc::new(checks),
        }
    }
}

impl CheckDirectory for RecordingChecks {
    async fn failing_checks(&self) -> anyhow::Result<Vec<FailingCheck>> {
        self.log.push("failing_checks".to_string());
        Ok(self.checks.iter().map(|(check, _)| check.clone()).collect())
    }

    async fn contacts<'s>(&'s self, check: &'s FailingCheck) -> anyhow::Result<Vec<Contact>> {
        self.log
            .push(format!("contacts {}:{}", check.entity, check.check));
        Ok(self
            .checks
            .iter()
            .find(|(c, _)| c == check)
            .map(|(_, contacts)| contacts.clone())
            .unwrap_or_default())
    }
}

/// FakePager records submitted events and queries. No-op events succeed
/// per `noop_results` (then always), and all other events succeed.
/// Queries match per `acknowledgements`, keyed on (subdomain, check).
#[derive(Debug, Clone, Default)]
pub struct FakePager {
    log: Log,
    noop_results: Arc<Mutex<VecDeque<bool>>>,
    acknowledgements: Arc<HashMap<(String, String), AcknowledgedBy>>,
    events: Arc<Mutex<Vec<PagerEvent>>>,
}

impl FakePager {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            ..Default::default()
        }
    }

    pub fn with_noop_results(mut self, results: Vec<bool>) -> Self {
        self.noop_results = Arc::new(Mutex::new(results.into()));
        self
    }

    pub fn with_acknowledgement(mut self, subdomain: &str, check: &str, by: AcknowledgedBy) -> Self {
        let mut acknowledgements = (*self.acknowledgements).clone();
        acknowledgements.insert((subdomain.to_string(), check.to_string()), by);
        self.acknowledgements = Arc::new(acknowledgements);
        self
    }

    pub fn events(&self) -> Vec<PagerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Pager for FakePager {
    async fn submit_event<'s>(&'s self, event: &'s PagerEvent) -> bool {
        self.log.push(format!(
            "submit {:?} {}",
            event.event_type, event.incident_key
        ));
        self.events.lock().unwrap().push(event.clone());

        if *event == PagerEvent::noop() {
            self.noop_results.lock().unwrap().pop_front().unwrap_or(true)
        } else {
            true
        }
    }

    async fn query_acknowledgement<'s>(
        &'s self,
        credentials: &'s Credentials,
        check_key: &'s str,
        _since: DateTime<Utc>,
        _until: DateTime<Utc>,
    ) -> Option<AcknowledgementMatch> {
        let subdomain = credentials.subdomain.clone().unwrap_or_default();
        self.log.push(format!("query {subdomain} {check_key}"));

        self.acknowledgements
            .get(&(subdomain, check_key.to_string()))
            .map(|by| AcknowledgementMatch {
                check: check_key.to_string(),
                acknowledged_by: by.clone(),
            })
    }
}
