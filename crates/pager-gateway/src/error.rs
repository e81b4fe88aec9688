/// Error encountered while talking to PagerDuty.
///
/// These errors never escape the gateway's loops: the component which made
/// the call logs them and reduces them to a failed or absent result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to call PagerDuty")]
    Transport(#[from] reqwest::Error),
    #[error("PagerDuty responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("PagerDuty did not accept the event (status {status:?})")]
    Rejected { status: Option<String> },
    #[error("failed to decode PagerDuty response")]
    Decode(#[from] serde_json::Error),
    #[error("invalid PagerDuty URL")]
    Url(#[from] url::ParseError),
    #[error("PagerDuty credentials have a missing or invalid {0}")]
    Credentials(&'static str),
}

impl Error {
    /// Transient errors may succeed if retried on a later cycle.
    /// Credential errors will not, until the contact's configuration changes.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Error::Credentials(_) | Error::Url(_))
    }
}
