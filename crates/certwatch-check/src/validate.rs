use chrono::{DateTime, Utc};
use x509_parser::asn1_rs::oid;
use x509_parser::der_parser::oid::Oid;
use x509_parser::oid_registry;
use x509_parser::prelude::*;

/// ecdsa-with-SHA1; absent from the bundled OID registry.
pub(crate) const OID_SIG_ECDSA_WITH_SHA1: Oid<'static> = oid!(1.2.840.10045.4.1);

pub(crate) const HOSTNAME_ISSUE: &str = "Hostname is not valid";
pub(crate) const DATES_ISSUE: &str = "Certificate is not valid yet or expired";
pub(crate) const SIGNATURE_ISSUE: &str = "SHA1 is not a secure signature algorithm";

/// Runs the three trust checks against a parsed certificate.
///
/// All checks are evaluated even when an earlier one fails, so the caller
/// receives the complete issue list. Messages are appended in the fixed
/// order: hostname, dates, signature.
pub(crate) fn validate(
    cert: &X509Certificate<'_>,
    hostname: &str,
    skip_hostname: bool,
    now: DateTime<Utc>,
) -> (bool, Vec<String>) {
    let hostname_valid = skip_hostname || hostname_matches(cert, hostname);

    let not_before = cert.validity().not_before.to_datetime().unix_timestamp();
    let not_after = cert.validity().not_after.to_datetime().unix_timestamp();
    let dates_valid = not_before < now.timestamp() && now.timestamp() < not_after;

    let signature_valid = !is_weak_signature(&signature_name(&cert.signature_algorithm.algorithm));

    let mut issues = Vec::new();
    if !hostname_valid {
        issues.push(HOSTNAME_ISSUE.to_string());
    }
    if !dates_valid {
        issues.push(DATES_ISSUE.to_string());
    }
    if !signature_valid {
        issues.push(SIGNATURE_ISSUE.to_string());
    }

    (hostname_valid && dates_valid && signature_valid, issues)
}

/// X.509 hostname matching: SAN DNS names with single-label wildcard
/// support; the subject common name is consulted only when the certificate
/// carries no SAN DNS names at all.
pub(crate) fn hostname_matches(cert: &X509Certificate<'_>, hostname: &str) -> bool {
    let san_names: Vec<String> = cert
        .subject_alternative_name()
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
        .unwrap_or_default();

    if !san_names.is_empty() {
        return san_names.iter().any(|name| dns_name_matches(name, hostname));
    }

    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(|cn| dns_name_matches(cn, hostname))
        .unwrap_or(false)
}

/// RFC 6125 presented-identifier match: case-insensitive, wildcard allowed
/// only as the entire left-most label and matching exactly one label.
fn dns_name_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    if let Some(suffix) = pattern.strip_prefix("*.") {
        return match host.split_once('.') {
            Some((first, rest)) => !first.is_empty() && rest == suffix,
            None => false,
        };
    }

    pattern == host
}

/// Maps a signature algorithm OID to a readable name. Unknown algorithms
/// fall back to the dotted OID string.
pub(crate) fn signature_name(oid: &Oid) -> String {
    let known = [
        (oid_registry::OID_PKCS1_SHA256WITHRSA, "SHA256withRSA"),
        (oid_registry::OID_PKCS1_SHA384WITHRSA, "SHA384withRSA"),
        (oid_registry::OID_PKCS1_SHA512WITHRSA, "SHA512withRSA"),
        (oid_registry::OID_PKCS1_SHA1WITHRSA, "SHA1withRSA"),
        (oid_registry::OID_PKCS1_MD5WITHRSAENC, "MD5withRSA"),
        (oid_registry::OID_PKCS1_MD2WITHRSAENC, "MD2withRSA"),
        (oid_registry::OID_SIG_ECDSA_WITH_SHA256, "ECDSAwithSHA256"),
        (oid_registry::OID_SIG_ECDSA_WITH_SHA384, "ECDSAwithSHA384"),
        (oid_registry::OID_SIG_ECDSA_WITH_SHA512, "ECDSAwithSHA512"),
        (OID_SIG_ECDSA_WITH_SHA1, "ECDSAwithSHA1"),
        (oid_registry::OID_SIG_DSA_WITH_SHA1, "DSAwithSHA1"),
        (oid_registry::OID_SIG_ED25519, "Ed25519"),
    ];
    for (known_oid, name) in &known {
        if oid == known_oid {
            return name.to_string();
        }
    }
    format!("{oid}")
}

/// SHA1-digest signatures (RSA, DSA or ECDSA flavored) and the MD-family
/// digests always fail the signature check, regardless of chain trust.
pub(crate) fn is_weak_signature(name: &str) -> bool {
    ["SHA1", "MD5", "MD2"].iter().any(|weak| name.contains(weak))
}
