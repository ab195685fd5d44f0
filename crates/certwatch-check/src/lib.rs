//! Certificate acquisition and validation service.
//!
//! Normalizes two certificate sources (live TLS handshake, vault object)
//! into one [`CertCheckResult`] and applies a multi-criteria trust check:
//! hostname match, temporal validity and signature strength. The service
//! reports the certificate's own trust data; it never acts as a trusting
//! client, so chain trust is deliberately not verified during acquisition.

mod tls;
mod validate;
pub mod vault;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use certwatch_common::types::{CertCheckResult, CheckCertItem, CheckCertType, OtherCert};
use chrono::{DateTime, Duration, TimeZone, Utc};
use url::Url;
use x509_parser::prelude::*;

use vault::{KeyVaultClient, VaultCertificateSource};

/// Errors raised by the check service.
///
/// `InvalidItem` and `InvalidUrl` are configuration failures and are never
/// retried; the remaining variants are acquisition failures the scheduler
/// recovers from per certificate.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("check item requires both a name and a url")]
    InvalidItem,

    #[error("invalid check url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("connection to {host} failed: {reason}")]
    Connect { host: String, reason: String },

    #[error("TLS handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    #[error("vault request failed: {0}")]
    Vault(String),

    #[error("failed to parse X.509 certificate: {0}")]
    ParseCertificate(String),
}

/// Single entry point for checking one configured certificate.
///
/// Owns the connect timeout and the vault client; construct once and share
/// by reference between the scheduler and any other callers.
pub struct CertChecker {
    connect_timeout_secs: u64,
    vault: Arc<dyn VaultCertificateSource>,
}

impl CertChecker {
    pub fn new(connect_timeout_secs: u64) -> Self {
        Self::with_vault_source(connect_timeout_secs, Arc::new(KeyVaultClient::new()))
    }

    pub fn with_vault_source(
        connect_timeout_secs: u64,
        vault: Arc<dyn VaultCertificateSource>,
    ) -> Self {
        Self {
            connect_timeout_secs,
            vault,
        }
    }

    /// Checks the status of one configured certificate.
    ///
    /// A plaintext endpoint is a valid "not secured" finding, returned as a
    /// result with `is_valid = false` and no dates. Transport and vault
    /// failures are returned as errors and contribute no result.
    pub async fn check_status(
        &self,
        item: &CheckCertItem,
        warning_days: i64,
    ) -> Result<CertCheckResult, CheckError> {
        if item.name.is_empty() || item.url.is_empty() {
            return Err(CheckError::InvalidItem);
        }

        match item.kind {
            CheckCertType::Url => self.check_url_status(item, warning_days).await,
            CheckCertType::VaultCertificate => self.check_vault_status(item, warning_days).await,
        }
    }

    async fn check_url_status(
        &self,
        item: &CheckCertItem,
        warning_days: i64,
    ) -> Result<CertCheckResult, CheckError> {
        let parsed = Url::parse(&item.url).map_err(|e| CheckError::InvalidUrl {
            url: item.url.clone(),
            reason: e.to_string(),
        })?;

        if parsed.scheme() != "https" {
            // No TLS session to audit; report the endpoint as not secured.
            return Ok(not_secured_result(&item.name));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| CheckError::InvalidUrl {
                url: item.url.clone(),
                reason: "missing host".into(),
            })?
            .to_string();
        let port = parsed.port().unwrap_or(443);

        let (chain, tls_version) =
            tls::fetch_peer_chain(&host, port, self.connect_timeout_secs).await?;

        let (_, leaf) = X509Certificate::from_der(chain[0].as_ref())
            .map_err(|e| CheckError::ParseCertificate(e.to_string()))?;

        Ok(build_result(
            &item.name,
            &leaf,
            tls_version,
            other_certs(&chain[1..]),
            false,
            warning_days,
            Utc::now(),
        ))
    }

    async fn check_vault_status(
        &self,
        item: &CheckCertItem,
        warning_days: i64,
    ) -> Result<CertCheckResult, CheckError> {
        let (vault_base, cert_name) = parse_vault_url(&item.url)?;

        tracing::info!(vault = %vault_base, certificate = %cert_name, "Fetching certificate from vault");

        let der = self.vault.fetch_certificate(&vault_base, &cert_name).await?;
        let (_, cert) = X509Certificate::from_der(&der)
            .map_err(|e| CheckError::ParseCertificate(e.to_string()))?;

        // Vault objects carry only the leaf and no handshake-bound hostname.
        Ok(build_result(
            &item.name,
            &cert,
            0,
            Vec::new(),
            true,
            warning_days,
            Utc::now(),
        ))
    }
}

/// Splits a vault item URL into the vault base address and the certificate
/// name (second path segment, kept URL-encoded for reuse in request paths).
fn parse_vault_url(raw: &str) -> Result<(String, String), CheckError> {
    let parsed = Url::parse(raw).map_err(|e| CheckError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    let cert_name = parsed
        .path_segments()
        .and_then(|mut segments| segments.nth(1))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CheckError::InvalidUrl {
            url: raw.to_string(),
            reason: "vault url must contain a certificate name path segment".into(),
        })?
        .to_string();

    Ok((parsed.origin().ascii_serialization(), cert_name))
}

/// Assembles the external-facing result record from a parsed leaf
/// certificate. `now` is injected so the date-derived fields are
/// deterministic under test.
fn build_result(
    name: &str,
    cert: &X509Certificate<'_>,
    tls_version: u16,
    other_certs: Vec<OtherCert>,
    skip_hostname: bool,
    warning_days: i64,
    now: DateTime<Utc>,
) -> CertCheckResult {
    let not_before = asn1_to_datetime(&cert.validity().not_before);
    let not_after = asn1_to_datetime(&cert.validity().not_after);

    let (is_valid, validation_issues) = validate::validate(cert, name, skip_hostname, now);

    let expiration_warning = not_after
        .map(|end| end < now + Duration::days(warning_days))
        .unwrap_or(false);

    let validity_days = not_after
        .map(|end| (end - now).num_days().max(0))
        .unwrap_or(0);

    CertCheckResult {
        hostname: name.to_string(),
        issuer: first_common_name(cert.issuer()),
        signature: validate::signature_name(&cert.signature_algorithm.algorithm),
        cert_start_date: not_before,
        cert_end_date: not_after,
        cert_dns_names: dns_names(cert),
        is_valid,
        tls_version,
        is_ca: cert.is_ca(),
        common_name: first_common_name(cert.subject()),
        other_certs,
        validation_issues,
        expiration_warning,
        validity_days,
    }
}

/// Result for an endpoint that answered without a TLS session.
fn not_secured_result(name: &str) -> CertCheckResult {
    CertCheckResult {
        hostname: name.to_string(),
        issuer: String::new(),
        signature: String::new(),
        cert_start_date: None,
        cert_end_date: None,
        cert_dns_names: Vec::new(),
        is_valid: false,
        tls_version: 0,
        is_ca: false,
        common_name: String::new(),
        other_certs: Vec::new(),
        validation_issues: Vec::new(),
        expiration_warning: false,
        validity_days: 0,
    }
}

fn asn1_to_datetime(time: &ASN1Time) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(time.to_datetime().unix_timestamp(), 0).single()
}

fn first_common_name(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn dns_names(cert: &X509Certificate<'_>) -> Vec<String> {
    cert.subject_alternative_name()
        .ok()
        .flatten()
        .map(|san| {
            san.value
                .general_names
                .iter()
                .filter_map(|gn| match gn {
                    GeneralName::DNSName(dns) => Some(dns.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Projects the chain minus the leaf into [`OtherCert`] records, in chain
/// order. Certificates that fail to parse are skipped.
fn other_certs(chain: &[rustls::pki_types::CertificateDer<'static>]) -> Vec<OtherCert> {
    chain
        .iter()
        .filter_map(|der| match X509Certificate::from_der(der.as_ref()) {
            Ok((_, cert)) => Some(OtherCert {
                common_name: first_common_name(cert.subject()),
                issuer: first_common_name(cert.issuer()),
                is_ca: cert.is_ca(),
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unparsable chain certificate");
                None
            }
        })
        .collect()
}
