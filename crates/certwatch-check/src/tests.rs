use std::sync::Arc;

use certwatch_common::types::{CheckCertItem, CheckCertType};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rcgen::{CertificateParams, DnType, KeyPair};
use x509_parser::prelude::*;

use crate::validate::{self, DATES_ISSUE, HOSTNAME_ISSUE};
use crate::vault::VaultCertificateSource;
use crate::{build_result, parse_vault_url, CertChecker, CheckError};

/// Current time truncated to whole seconds, matching X.509 date precision.
fn now_secs() -> DateTime<Utc> {
    Utc.timestamp_opt(Utc::now().timestamp(), 0).unwrap()
}

fn self_signed(
    sans: &[&str],
    common_name: Option<&str>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
) -> Vec<u8> {
    let mut params =
        CertificateParams::new(sans.iter().map(|s| s.to_string()).collect::<Vec<_>>()).unwrap();
    if let Some(cn) = common_name {
        params.distinguished_name.push(DnType::CommonName, cn);
    }
    params.not_before =
        ::time::OffsetDateTime::from_unix_timestamp(not_before.timestamp()).unwrap();
    params.not_after =
        ::time::OffsetDateTime::from_unix_timestamp(not_after.timestamp()).unwrap();
    let key = KeyPair::generate().unwrap();
    params.self_signed(&key).unwrap().der().to_vec()
}

#[test]
fn valid_certificate_has_no_issues() {
    let now = now_secs();
    let der = self_signed(
        &["example.com"],
        None,
        now - Duration::days(1),
        now + Duration::days(60),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    let (is_valid, issues) = validate::validate(&cert, "example.com", false, now);
    assert!(is_valid);
    assert!(issues.is_empty());
}

#[test]
fn expired_certificate_reports_dates_issue() {
    let now = now_secs();
    let der = self_signed(
        &["example.com"],
        None,
        now - Duration::days(10),
        now - Duration::days(1),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    let (is_valid, issues) = validate::validate(&cert, "example.com", false, now);
    assert!(!is_valid);
    assert_eq!(issues, vec![DATES_ISSUE.to_string()]);
}

#[test]
fn not_yet_valid_certificate_reports_dates_issue() {
    let now = now_secs();
    let der = self_signed(
        &["example.com"],
        None,
        now + Duration::days(1),
        now + Duration::days(30),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    let (is_valid, issues) = validate::validate(&cert, "example.com", false, now);
    assert!(!is_valid);
    assert_eq!(issues, vec![DATES_ISSUE.to_string()]);
}

#[test]
fn hostname_mismatch_reports_hostname_issue() {
    let now = now_secs();
    let der = self_signed(
        &["example.com"],
        None,
        now - Duration::days(1),
        now + Duration::days(60),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    let (is_valid, issues) = validate::validate(&cert, "other.example.net", false, now);
    assert!(!is_valid);
    assert_eq!(issues, vec![HOSTNAME_ISSUE.to_string()]);
}

#[test]
fn issues_keep_fixed_order() {
    let now = now_secs();
    let der = self_signed(
        &["example.com"],
        None,
        now - Duration::days(10),
        now - Duration::days(1),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    let (is_valid, issues) = validate::validate(&cert, "other.example.net", false, now);
    assert!(!is_valid);
    assert_eq!(
        issues,
        vec![HOSTNAME_ISSUE.to_string(), DATES_ISSUE.to_string()]
    );
}

#[test]
fn skipped_hostname_check_accepts_any_name() {
    let now = now_secs();
    let der = self_signed(
        &["example.com"],
        None,
        now - Duration::days(1),
        now + Duration::days(60),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    let (is_valid, issues) = validate::validate(&cert, "unrelated.host", true, now);
    assert!(is_valid);
    assert!(issues.is_empty());
}

#[test]
fn wildcard_matches_exactly_one_label() {
    let now = now_secs();
    let der = self_signed(
        &["*.example.com"],
        None,
        now - Duration::days(1),
        now + Duration::days(60),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    assert!(validate::hostname_matches(&cert, "api.example.com"));
    assert!(validate::hostname_matches(&cert, "API.EXAMPLE.COM"));
    assert!(!validate::hostname_matches(&cert, "example.com"));
    assert!(!validate::hostname_matches(&cert, "a.b.example.com"));
}

#[test]
fn common_name_is_fallback_only_without_san() {
    let now = now_secs();
    let with_cn_only = self_signed(
        &[],
        Some("example.com"),
        now - Duration::days(1),
        now + Duration::days(60),
    );
    let (_, cert) = X509Certificate::from_der(&with_cn_only).unwrap();
    assert!(validate::hostname_matches(&cert, "example.com"));

    // A SAN is present, so a CN-only match no longer counts.
    let with_san = self_signed(
        &["other.example.net"],
        Some("example.com"),
        now - Duration::days(1),
        now + Duration::days(60),
    );
    let (_, cert) = X509Certificate::from_der(&with_san).unwrap();
    assert!(!validate::hostname_matches(&cert, "example.com"));
}

#[test]
fn signature_names_and_weakness() {
    let now = now_secs();
    let der = self_signed(
        &["example.com"],
        None,
        now - Duration::days(1),
        now + Duration::days(60),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    // rcgen's default key pair signs with ECDSA P-256 / SHA-256.
    assert_eq!(
        validate::signature_name(&cert.signature_algorithm.algorithm),
        "ECDSAwithSHA256"
    );

    assert!(validate::is_weak_signature("SHA1withRSA"));
    assert!(validate::is_weak_signature("MD5withRSA"));
    assert!(!validate::is_weak_signature("SHA256withRSA"));
    assert!(!validate::is_weak_signature("Ed25519"));
}

#[test]
fn weak_signature_family_is_flagged_by_oid() {
    use x509_parser::oid_registry;

    let weak = [
        &oid_registry::OID_PKCS1_SHA1WITHRSA,
        &oid_registry::OID_PKCS1_MD5WITHRSAENC,
        &oid_registry::OID_PKCS1_MD2WITHRSAENC,
        &oid_registry::OID_SIG_DSA_WITH_SHA1,
        &validate::OID_SIG_ECDSA_WITH_SHA1,
    ];
    for oid in weak {
        let name = validate::signature_name(oid);
        assert!(!name.contains('.'), "{name} should be mapped, not a raw OID");
        assert!(validate::is_weak_signature(&name), "{name} should be weak");
    }

    let strong = [
        &oid_registry::OID_PKCS1_SHA256WITHRSA,
        &oid_registry::OID_SIG_ECDSA_WITH_SHA256,
        &oid_registry::OID_SIG_ED25519,
    ];
    for oid in strong {
        let name = validate::signature_name(oid);
        assert!(!validate::is_weak_signature(&name), "{name} should not be weak");
    }
}

#[test]
fn expiration_warning_is_independent_of_validity() {
    let now = now_secs();

    // Valid for another 10 days: inside a 30-day window, outside a 5-day one.
    let der = self_signed(
        &["example.com"],
        None,
        now - Duration::days(1),
        now + Duration::days(10),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    let result = build_result("example.com", &cert, 0, Vec::new(), false, 30, now);
    assert!(result.is_valid);
    assert!(result.expiration_warning);
    assert_eq!(result.validity_days, 10);

    let result = build_result("example.com", &cert, 0, Vec::new(), false, 5, now);
    assert!(!result.expiration_warning);

    // Already expired: invalid, but the warning flag still fires.
    let expired = self_signed(
        &["example.com"],
        None,
        now - Duration::days(10),
        now - Duration::days(1),
    );
    let (_, cert) = X509Certificate::from_der(&expired).unwrap();
    let result = build_result("example.com", &cert, 0, Vec::new(), false, 30, now);
    assert!(!result.is_valid);
    assert!(result.expiration_warning);
    assert_eq!(result.validity_days, 0);
}

#[test]
fn result_carries_configured_name_and_dns_names() {
    let now = now_secs();
    let der = self_signed(
        &["example.com", "www.example.com"],
        Some("example.com"),
        now - Duration::days(1),
        now + Duration::days(60),
    );
    let (_, cert) = X509Certificate::from_der(&der).unwrap();

    let result = build_result("prod-site", &cert, 0x0304, Vec::new(), false, 30, now);
    assert_eq!(result.hostname, "prod-site");
    assert_eq!(result.tls_version, 0x0304);
    assert_eq!(
        result.cert_dns_names,
        vec!["example.com".to_string(), "www.example.com".to_string()]
    );
    assert_eq!(result.common_name, "example.com");
    assert!(!result.is_ca);
}

#[test]
fn parse_vault_url_extracts_base_and_name() {
    let (base, name) =
        parse_vault_url("https://myvault.vault.azure.net/certificates/prod-cert").unwrap();
    assert_eq!(base, "https://myvault.vault.azure.net");
    assert_eq!(name, "prod-cert");

    assert!(matches!(
        parse_vault_url("https://myvault.vault.azure.net/"),
        Err(CheckError::InvalidUrl { .. })
    ));
}

#[tokio::test]
async fn empty_item_fields_fail_before_any_network_call() {
    let checker = CertChecker::new(1);
    let item = CheckCertItem {
        name: String::new(),
        url: "https://example.com".into(),
        kind: CheckCertType::Url,
    };
    assert!(matches!(
        checker.check_status(&item, 30).await,
        Err(CheckError::InvalidItem)
    ));

    let item = CheckCertItem {
        name: "example.com".into(),
        url: String::new(),
        kind: CheckCertType::Url,
    };
    assert!(matches!(
        checker.check_status(&item, 30).await,
        Err(CheckError::InvalidItem)
    ));
}

#[tokio::test]
async fn plaintext_endpoint_is_a_not_secured_finding() {
    let checker = CertChecker::new(1);
    let item = CheckCertItem {
        name: "example.com".into(),
        url: "http://example.com".into(),
        kind: CheckCertType::Url,
    };

    let result = checker.check_status(&item, 30).await.unwrap();
    assert!(!result.is_valid);
    assert!(result.cert_start_date.is_none());
    assert!(result.cert_end_date.is_none());
    assert!(result.validation_issues.is_empty());
    assert_eq!(result.validity_days, 0);
}

struct StubVault {
    der: Vec<u8>,
}

#[async_trait::async_trait]
impl VaultCertificateSource for StubVault {
    async fn fetch_certificate(
        &self,
        _vault_base: &str,
        _cert_name: &str,
    ) -> Result<Vec<u8>, CheckError> {
        Ok(self.der.clone())
    }
}

#[tokio::test]
async fn vault_results_skip_hostname_and_have_no_chain() {
    let now = now_secs();
    let der = self_signed(
        &["internal.service"],
        None,
        now - Duration::days(1),
        now + Duration::days(200),
    );

    let checker = CertChecker::with_vault_source(1, Arc::new(StubVault { der }));
    let item = CheckCertItem {
        name: "myvault.vault.azure.net/prod-cert".into(),
        url: "https://myvault.vault.azure.net/certificates/prod-cert".into(),
        kind: CheckCertType::VaultCertificate,
    };

    let result = checker.check_status(&item, 30).await.unwrap();
    // The configured name never matches the SAN, but vault checks skip it.
    assert!(result.is_valid);
    assert!(result.validation_issues.is_empty());
    assert!(result.other_certs.is_empty());
    assert_eq!(result.tls_version, 0);
    assert_eq!(result.hostname, "myvault.vault.azure.net/prod-cert");
}

#[tokio::test]
#[ignore] // needs network access
async fn live_check_against_example_com() {
    let checker = CertChecker::new(10);
    let item = CheckCertItem {
        name: "example.com".into(),
        url: "https://example.com".into(),
        kind: CheckCertType::Url,
    };

    let result = checker.check_status(&item, 90).await.unwrap();
    assert!(result.is_valid);
    assert!(result.validation_issues.is_empty());
    assert!(result
        .cert_dns_names
        .iter()
        .any(|name| name == "example.com"));
    assert!(result.tls_version > 0);
}
