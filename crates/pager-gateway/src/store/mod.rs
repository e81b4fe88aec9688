//! Interfaces of the shared store through which the gateway receives
//! notifications, serializes reconciliation, and reaches the platform's
//! event intake, as well as the directory of failing checks.

use crate::checks::{Contact, FailingCheck};
use serde_json::value::RawValue;
use std::future::Future;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Queue is a set of named, ordered lists of JSON items.
pub trait Queue: Send + Sync + 'static {
    /// Remove and return the oldest item of `key`, without blocking.
    fn pop<'s>(
        &'s self,
        key: &'s str,
    ) -> impl Future<Output = anyhow::Result<Option<Box<RawValue>>>> + Send + 's;

    /// Append `body` to `key`, waking any blocked poppers.
    fn push<'s>(
        &'s self,
        key: &'s str,
        body: Box<RawValue>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send + 's;

    /// Remove and return the oldest item of `key`, waiting up to `timeout`
    /// for one to be pushed if `key` is empty.
    fn blocking_pop<'s>(
        &'s self,
        key: &'s str,
        timeout: std::time::Duration,
    ) -> impl Future<Output = anyhow::Result<Option<Box<RawValue>>>> + Send + 's;
}

/// LeaseStore holds leases: keys which are created atomically,
/// may be given an expiry, and are deleted unconditionally.
pub trait LeaseStore: Send + Sync + 'static {
    /// Create `key` with `value` unless it exists, returning true iff created.
    fn create_if_absent<'s>(
        &'s self,
        key: &'s str,
        value: &'s str,
    ) -> impl Future<Output = anyhow::Result<bool>> + Send + 's;

    /// Expire `key` after `ttl`.
    fn expire<'s>(
        &'s self,
        key: &'s str,
        ttl: std::time::Duration,
    ) -> impl Future<Output = anyhow::Result<()>> + Send + 's;

    /// Delete `key`, whether or not it exists.
    fn delete<'s>(&'s self, key: &'s str) -> impl Future<Output = anyhow::Result<()>> + Send + 's;
}

/// CheckDirectory lists the checks which are failing, and who owns them.
pub trait CheckDirectory: Send + Sync + 'static {
    /// All checks currently in one of the `FAILING_STATES`.
    fn failing_checks(&self) -> impl Future<Output = anyhow::Result<Vec<FailingCheck>>> + Send + '_;

    /// Contacts who own `check`.
    fn contacts<'s>(
        &'s self,
        check: &'s FailingCheck,
    ) -> impl Future<Output = anyhow::Result<Vec<Contact>>> + Send + 's;
}
