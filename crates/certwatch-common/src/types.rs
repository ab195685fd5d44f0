use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a configured certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCertType {
    /// Live TLS endpoint; the certificate is observed during the handshake.
    Url,
    /// Certificate object stored in a remote secret vault.
    VaultCertificate,
}

/// A configured check target, created once at startup from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCertItem {
    /// Display and lookup key, unique within a run.
    pub name: String,
    /// Connection URL or vault object locator.
    pub url: String,
    #[serde(rename = "type")]
    pub kind: CheckCertType,
}

/// Minimal projection of a non-leaf certificate in the peer chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherCert {
    pub common_name: String,
    pub issuer: String,
    pub is_ca: bool,
}

/// Outcome of one certificate check. Built fresh per check, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertCheckResult {
    /// The configured item name, not re-derived from the handshake.
    pub hostname: String,
    /// Issuer common name of the leaf certificate.
    pub issuer: String,
    /// Human-readable signature algorithm name (e.g. `SHA256withRSA`).
    pub signature: String,
    pub cert_start_date: Option<DateTime<Utc>>,
    pub cert_end_date: Option<DateTime<Utc>>,
    /// Subject alternative DNS names, in certificate order.
    pub cert_dns_names: Vec<String>,
    pub is_valid: bool,
    /// Negotiated TLS protocol version; 0 when not applicable (vault source).
    pub tls_version: u16,
    pub is_ca: bool,
    /// Subject common name of the leaf certificate.
    pub common_name: String,
    /// Chain minus the leaf; always empty for vault-sourced certificates.
    pub other_certs: Vec<OtherCert>,
    /// Human-readable findings; empty when the certificate is valid.
    pub validation_issues: Vec<String>,
    /// True iff the certificate expires inside the warning window,
    /// independent of overall validity.
    pub expiration_warning: bool,
    /// Whole days of validity remaining; never negative, 0 when dates are
    /// absent or already past.
    pub validity_days: i64,
}

/// Notification projection of a [`CertCheckResult`], built per scheduler tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertCheckNotification {
    pub hostname: String,
    pub is_valid: bool,
    pub expiration_warning: bool,
    /// Validation issues, plus the expiry countdown for valid-but-expiring
    /// certificates.
    pub messages: Vec<String>,
}

/// Notification filtering threshold, ordered from least to most strict.
///
/// # Examples
///
/// ```
/// use certwatch_common::types::NotificationLevel;
///
/// let level: NotificationLevel = "Error".parse().unwrap();
/// assert_eq!(level, NotificationLevel::Error);
/// assert_eq!(NotificationLevel::parse_or_default("bogus"), NotificationLevel::Warning);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationLevel {
    /// Every checked certificate is reported, healthy ones included.
    Info,
    /// Invalid or expiring certificates are reported.
    Warning,
    /// Only hard failures are reported.
    Error,
}

impl NotificationLevel {
    /// Parses a level name, falling back to the documented default
    /// (`Warning`) for anything unrecognized.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or(NotificationLevel::Warning)
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationLevel::Info => write!(f, "Info"),
            NotificationLevel::Warning => write!(f, "Warning"),
            NotificationLevel::Error => write!(f, "Error"),
        }
    }
}

impl std::str::FromStr for NotificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Info" => Ok(NotificationLevel::Info),
            "Warning" => Ok(NotificationLevel::Warning),
            "Error" => Ok(NotificationLevel::Error),
            _ => Err(format!("unknown notification level: {s}")),
        }
    }
}
