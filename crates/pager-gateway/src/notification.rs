/// NotificationType is the kind of a routed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Problem,
    Recovery,
    Acknowledgement,
    Test,
}

/// Notification is a message routed to the gateway on behalf of a contact,
/// as it's encoded onto the notification queue.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    #[serde(rename = "notification_type")]
    pub kind: NotificationType,
    /// Address of the recipient, which for PagerDuty is a service key.
    pub address: String,
    /// Current state of the check.
    #[serde(default)]
    pub state: String,
    /// State of the check before it transitioned to `state`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_state: Option<String>,
    /// Seconds for which the check has been in `state`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unix timestamp (seconds) at which the notification was raised.
    pub time: i64,
    pub entity: String,
    pub check: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_last_name: Option<String>,
}

impl Notification {
    /// Full name of the contact on whose behalf this notification was routed, if known.
    pub fn contact_name(&self) -> Option<String> {
        match (&self.contact_first_name, &self.contact_last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }
}
