//! Postgres queries backing the queues, leases and failing-check listings
//! of the PagerDuty gateway. Tables are described by
//! `migrations/0001_pager_gateway.sql`.

pub mod checks;
pub mod leases;
pub mod queue;

pub use checks::{ContactRow, FailingCheckRow};
