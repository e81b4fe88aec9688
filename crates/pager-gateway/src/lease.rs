use crate::store::LeaseStore;
use std::time::Duration;

/// Value written to every lease. Holding a lease is a matter of having
/// created it, so its value carries no meaning.
const LEASE_VALUE: &str = "true";

/// LeaseManager provides mutual exclusion across gateway processes
/// through leases held in a shared LeaseStore.
///
/// There is no fairness between contending processes beyond
/// the atomicity of the store's create-if-absent.
#[derive(Debug, Clone)]
pub struct LeaseManager<L> {
    store: L,
}

/// Acquisition is the outcome of `LeaseManager::acquire_scoped`.
#[derive(Debug)]
pub enum Acquisition<L: LeaseStore + Clone> {
    /// The lease was acquired, and is held until the guard is released.
    Acquired(LeaseGuard<L>),
    /// Another process holds the lease.
    Contended,
}

impl<L: LeaseStore + Clone> LeaseManager<L> {
    pub fn new(store: L) -> Self {
        Self { store }
    }

    /// Try to acquire lease `key` with expiry `ttl`, returning true iff
    /// this call created it. Creation and expiry are separate store calls,
    /// so a holder which fails between them leaves a lease without expiry.
    pub async fn try_acquire(&self, key: &str, ttl: Duration) -> bool {
        let created = match self.store.create_if_absent(key, LEASE_VALUE).await {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(?err, %key, "failed to create lease, treating it as held elsewhere");
                false
            }
        };
        if created {
            self.set_expiry(key, ttl).await;
        }
        created
    }

    /// Expire lease `key` after `ttl`, bounding how long it remains held
    /// should its holder fail to release it.
    pub async fn set_expiry(&self, key: &str, ttl: Duration) {
        if let Err(err) = self.store.expire(key, ttl).await {
            tracing::warn!(?err, %key, ?ttl, "failed to set lease expiry");
        }
    }

    /// Release lease `key`. Releasing a lease which isn't held has no effect.
    pub async fn release(&self, key: &str) {
        if let Err(err) = self.store.delete(key).await {
            tracing::warn!(?err, %key, "failed to release lease (it will lapse at its expiry)");
        }
    }

    /// Acquire lease `key` with expiry `ttl`, returning a guard which holds it.
    ///
    /// If the lease is contended, it's released before returning. This clears
    /// a lease left behind by a holder which failed before setting its expiry,
    /// and may cut short the lease of a live holder, which keeps running its
    /// cycle regardless.
    pub async fn acquire_scoped(&self, key: &str, ttl: Duration) -> Acquisition<L> {
        if !self.try_acquire(key, ttl).await {
            self.release(key).await;
            return Acquisition::Contended;
        }

        Acquisition::Acquired(LeaseGuard {
            held: Some((self.clone(), key.to_string())),
        })
    }
}

/// LeaseGuard holds an acquired lease until `release` is called.
/// A guard dropped without being released releases its lease in the
/// background, if a tokio runtime is available.
#[derive(Debug)]
pub struct LeaseGuard<L: LeaseStore + Clone> {
    held: Option<(LeaseManager<L>, String)>,
}

impl<L: LeaseStore + Clone> LeaseGuard<L> {
    pub fn key(&self) -> &str {
        self.held.as_ref().map_or("", |(_, key)| key.as_str())
    }

    pub async fn release(mut self) {
        if let Some((manager, key)) = self.held.take() {
            manager.release(&key).await;
        }
    }
}

impl<L: LeaseStore + Clone> Drop for LeaseGuard<L> {
    fn drop(&mut self) {
        let Some((manager, key)) = self.held.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(%key, "lease guard dropped without release, releasing in background");
                handle.spawn(async move { manager.release(&key).await });
            }
            Err(_) => {
                tracing::warn!(%key, "lease guard dropped outside of a runtime (it will lapse at its expiry)");
            }
        }
    }
}
