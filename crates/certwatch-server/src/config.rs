use certwatch_common::types::{CheckCertItem, CheckCertType};
use serde::Deserialize;
use url::Url;

/// Server configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Cron expression controlling when check executions run. Standard
    /// five-field expressions are accepted alongside six-field ones.
    pub schedule: String,

    /// Minimum finding level that triggers a delivery: `"Info"`,
    /// `"Warning"` or `"Error"`. Unrecognized values fall back to
    /// `"Warning"`.
    #[serde(default = "default_notification_level")]
    pub notification_level: String,

    /// Certificates expiring within this many days raise an expiration
    /// warning.
    #[serde(default = "default_warning_days")]
    pub warning_days: i64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub certs: Vec<CertEntry>,

    #[serde(default)]
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertEntry {
    /// Display name; defaults to the URL host when omitted.
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
    #[serde(rename = "type", default = "default_cert_type")]
    pub kind: CheckCertType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// `"teams"`, `"slack"` or `"none"`.
    #[serde(default = "default_notifier_kind")]
    pub kind: String,
    pub webhook_url: Option<String>,
    pub message_title: Option<String>,
    pub message_body: Option<String>,
    /// Link target for the "View details" action in outgoing messages.
    pub message_url: Option<String>,
    /// Comma-separated mention handles appended to Slack messages.
    pub mentions: Option<String>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: default_notifier_kind(),
            webhook_url: None,
            message_title: None,
            message_body: None,
            message_url: None,
            mentions: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolves the configured entries into check items, deriving missing
    /// names from the URL: the host for endpoint checks, `host/<cert>` for
    /// vault entries so one vault holding several certificates stays
    /// unambiguous.
    pub fn cert_items(&self) -> Vec<CheckCertItem> {
        self.certs
            .iter()
            .map(|entry| CheckCertItem {
                name: entry.name.clone().unwrap_or_else(|| derived_name(entry)),
                url: entry.url.clone(),
                kind: entry.kind,
            })
            .collect()
    }
}

fn derived_name(entry: &CertEntry) -> String {
    let parsed = Url::parse(&entry.url).ok();
    let host = parsed
        .as_ref()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| entry.url.clone());

    if entry.kind == CheckCertType::VaultCertificate {
        let cert_name = parsed
            .as_ref()
            .and_then(|u| u.path_segments())
            .and_then(|mut segments| segments.nth(1))
            .filter(|s| !s.is_empty());
        if let Some(cert_name) = cert_name {
            return format!("{host}/{cert_name}");
        }
    }

    host
}

fn default_notification_level() -> String {
    "Warning".to_string()
}

fn default_warning_days() -> i64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_cert_type() -> CheckCertType {
    CheckCertType::Url
}

fn default_notifier_kind() -> String {
    "none".to_string()
}
