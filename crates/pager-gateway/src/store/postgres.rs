use super::{CheckDirectory, LeaseStore, Queue};
use crate::checks::{Contact, FailingCheck, FAILING_STATES};
use crate::client::Credentials;
use anyhow::Context;
use serde_json::value::RawValue;

/// PgStore is a store backed by the tables of `pager-sql`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

impl Queue for PgStore {
    async fn pop<'s>(&'s self, key: &'s str) -> anyhow::Result<Option<Box<RawValue>>> {
        pager_sql::queue::pop(key, &self.pool)
            .await
            .with_context(|| format!("popping from queue {key}"))
    }

    async fn push<'s>(&'s self, key: &'s str, body: Box<RawValue>) -> anyhow::Result<()> {
        pager_sql::queue::push(key, &body, &self.pool)
            .await
            .with_context(|| format!("pushing to queue {key}"))
    }

    async fn blocking_pop<'s>(
        &'s self,
        key: &'s str,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Option<Box<RawValue>>> {
        if let Some(item) = Queue::pop(self, key).await? {
            return Ok(Some(item));
        }

        let mut listener = pager_sql::queue::listen(key, &self.pool)
            .await
            .with_context(|| format!("listening for pushes to queue {key}"))?;

        // Check again, as an item may have been pushed before we began listening.
        if let Some(item) = Queue::pop(self, key).await? {
            return Ok(Some(item));
        }

        match tokio::time::timeout(timeout, listener.recv()).await {
            Err(_elapsed) => Ok(None),
            Ok(notification) => {
                let _notification =
                    notification.with_context(|| format!("awaiting push to queue {key}"))?;
                Queue::pop(self, key).await
            }
        }
    }
}

impl LeaseStore for PgStore {
    async fn create_if_absent<'s>(&'s self, key: &'s str, value: &'s str) -> anyhow::Result<bool> {
        pager_sql::leases::create_if_absent(key, value, &self.pool)
            .await
            .with_context(|| format!("creating lease {key}"))
    }

    async fn expire<'s>(&'s self, key: &'s str, ttl: std::time::Duration) -> anyhow::Result<()> {
        pager_sql::leases::expire(key, ttl, &self.pool)
            .await
            .with_context(|| format!("expiring lease {key}"))
    }

    async fn delete<'s>(&'s self, key: &'s str) -> anyhow::Result<()> {
        pager_sql::leases::delete(key, &self.pool)
            .await
            .with_context(|| format!("deleting lease {key}"))
    }
}

impl CheckDirectory for PgStore {
    async fn failing_checks(&self) -> anyhow::Result<Vec<FailingCheck>> {
        let states: Vec<String> = FAILING_STATES.iter().map(|s| s.to_string()).collect();

        let rows = pager_sql::checks::fetch_failing_checks(&states, &self.pool)
            .await
            .context("fetching failing checks")?;

        Ok(rows
            .into_iter()
            .map(
                |pager_sql::FailingCheckRow {
                     entity,
                     check_name,
                     state,
                     scheduled_maintenance_until,
                     unscheduled_maintenance_until,
                 }| FailingCheck {
                    entity,
                    check: check_name,
                    state,
                    scheduled_maintenance_until,
                    unscheduled_maintenance_until,
                },
            )
            .collect())
    }

    async fn contacts<'s>(&'s self, check: &'s FailingCheck) -> anyhow::Result<Vec<Contact>> {
        let rows = pager_sql::checks::fetch_contacts(&check.entity, &check.check, &self.pool)
            .await
            .with_context(|| format!("fetching contacts of {}:{}", check.entity, check.check))?;

        Ok(rows.into_iter().map(into_contact).collect())
    }
}

fn into_contact(row: pager_sql::ContactRow) -> Contact {
    let pager_sql::ContactRow {
        contact_id,
        contact_name,
        service_key,
        subdomain,
        username,
        password,
    } = row;

    // A contact without any PagerDuty configuration has no credentials at all.
    let credentials = if [&service_key, &subdomain, &username, &password]
        .iter()
        .all(|part| part.is_none())
    {
        None
    } else {
        Some(Credentials {
            service_key,
            subdomain,
            username,
            password,
        })
    };

    Contact {
        id: contact_id,
        name: contact_name,
        credentials,
    }
}
