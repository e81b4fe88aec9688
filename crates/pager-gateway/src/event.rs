use crate::notification::{Notification, NotificationType};

/// Service key used when verifying connectivity with PagerDuty.
pub const NOOP_SERVICE_KEY: &str = "11111111111111111111111111111111";
/// Incident key used when verifying connectivity with PagerDuty.
pub const NOOP_INCIDENT_KEY: &str = "Flapjack is running a NOOP";
/// Description of every no-op event.
pub const NOOP_DESCRIPTION: &str = "I love APIs with noops.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Trigger,
    Acknowledge,
    Resolve,
    Nop,
}

/// PagerEvent is an event submitted to the PagerDuty events API.
/// All events sharing an `incident_key` apply to a single PagerDuty incident.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PagerEvent {
    pub service_key: String,
    pub incident_key: String,
    pub event_type: EventType,
    pub description: String,
}

impl PagerEvent {
    /// The synthetic event submitted to verify that PagerDuty is reachable.
    pub fn noop() -> Self {
        Self {
            service_key: NOOP_SERVICE_KEY.to_string(),
            incident_key: NOOP_INCIDENT_KEY.to_string(),
            event_type: EventType::Nop,
            description: NOOP_DESCRIPTION.to_string(),
        }
    }
}

/// Incident key of the check `check` of `entity`.
pub fn incident_key(entity: &str, check: &str) -> String {
    format!("{entity}:{check}")
}

/// Render a Notification into the PagerEvent which delivers it.
pub fn render(notification: &Notification) -> PagerEvent {
    let Notification {
        kind,
        address,
        state,
        entity,
        check,
        ..
    } = notification;

    let (event_type, description) = match kind {
        NotificationType::Problem => (
            EventType::Trigger,
            format!(r#"Problem: "{check}" on {entity} is {}"#, title_case(state)),
        ),
        NotificationType::Recovery => (
            EventType::Resolve,
            format!(r#"Recovery: "{check}" on {entity} is {}"#, title_case(state)),
        ),
        NotificationType::Acknowledgement => (
            EventType::Acknowledge,
            format!(r#"Acknowledgement: "{check}" on {entity}"#),
        ),
        NotificationType::Test => (EventType::Nop, NOOP_DESCRIPTION.to_string()),
    };

    PagerEvent {
        service_key: address.clone(),
        incident_key: incident_key(entity, check),
        event_type,
        description,
    }
}

// Upper-case the first character of `s`, leaving the remainder as-is.
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
