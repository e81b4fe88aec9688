use crate::client::Credentials;
use chrono::{DateTime, Utc};

/// States of a check which are considered to be failing.
pub const FAILING_STATES: [&str; 3] = ["critical", "warning", "unknown"];

/// FailingCheck is a monitored check which is currently failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailingCheck {
    pub entity: String,
    pub check: String,
    pub state: String,
    pub scheduled_maintenance_until: Option<DateTime<Utc>>,
    pub unscheduled_maintenance_until: Option<DateTime<Utc>>,
}

impl FailingCheck {
    pub fn new(entity: impl Into<String>, check: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            check: check.into(),
            state: state.into(),
            scheduled_maintenance_until: None,
            unscheduled_maintenance_until: None,
        }
    }

    /// Is the check within a scheduled or unscheduled maintenance window at `now`?
    pub fn in_maintenance(&self, now: DateTime<Utc>) -> bool {
        [
            self.scheduled_maintenance_until,
            self.unscheduled_maintenance_until,
        ]
        .into_iter()
        .flatten()
        .any(|until| until > now)
    }
}

/// Contact is a person who owns a check, and the PagerDuty credentials
/// through which their acknowledgements are found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub credentials: Option<Credentials>,
}
