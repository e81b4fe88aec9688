use std::time::Duration;

/// Default endpoint to which PagerDuty events are submitted.
pub const EVENTS_ENDPOINT: &str = "https://events.pagerduty.com/generic/2010-04-15/create_event.json";
/// Default template of the PagerDuty incidents API.
/// `{subdomain}` is replaced with the subdomain of a contact's account.
pub const INCIDENTS_API: &str = "https://{subdomain}.pagerduty.com/api/v1/incidents";

/// GatewayConfig is the configuration shared by the components of the gateway.
/// It's built once at startup and handed to each component as it's constructed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Queue of notifications routed to PagerDuty.
    pub queue: String,
    /// Queue of events consumed by the platform's event intake,
    /// onto which acknowledgement commands are pushed.
    pub events_queue: String,
    /// Key of the lease which serializes acknowledgement reconciliation.
    pub lease_key: String,
    /// Interval between attempts to reach PagerDuty at startup.
    #[serde(with = "humantime_serde")]
    pub connectivity_retry: Duration,
    /// Upper bound of an idle wait on the actions channel.
    #[serde(with = "humantime_serde")]
    pub actions_wait: Duration,
    /// Time-to-live of the reconciliation lease.
    #[serde(with = "humantime_serde")]
    pub lease_ttl: Duration,
    /// Delay between reconciliation cycles.
    #[serde(with = "humantime_serde")]
    pub reconcile_interval: Duration,
    /// Duration for which a check acknowledged in PagerDuty is suppressed.
    #[serde(with = "humantime_serde")]
    pub ack_duration: Duration,
    /// How far into the past acknowledged incidents are searched for.
    #[serde(with = "humantime_serde")]
    pub lookback: Duration,
    /// How far into the future acknowledged incidents are searched for.
    #[serde(with = "humantime_serde")]
    pub lookahead: Duration,
    /// Timeout of each request made to PagerDuty.
    #[serde(with = "humantime_serde")]
    pub http_timeout: Duration,
    /// Endpoint to which events are submitted.
    pub events_endpoint: String,
    /// Template of the incidents API, having a `{subdomain}` placeholder.
    pub incidents_api: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            queue: "pagerduty_notifications".to_string(),
            events_queue: "events".to_string(),
            lease_key: "sem_pagerduty_acks_running".to_string(),
            connectivity_retry: Duration::from_secs(10),
            actions_wait: Duration::from_secs(10),
            lease_ttl: Duration::from_secs(300),
            reconcile_interval: Duration::from_secs(10),
            ack_duration: Duration::from_secs(4 * 60 * 60),
            lookback: Duration::from_secs(7 * 24 * 60 * 60),
            lookahead: Duration::from_secs(24 * 60 * 60),
            http_timeout: Duration::from_secs(30),
            events_endpoint: EVENTS_ENDPOINT.to_string(),
            incidents_api: INCIDENTS_API.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Channel on which dispatch wake-ups and stop requests are delivered.
    pub fn actions_queue(&self) -> String {
        format!("{}_actions", self.queue)
    }
}
