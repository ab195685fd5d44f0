//! Vault-sourced certificate acquisition.
//!
//! The check service only needs "given a vault base URL and a certificate
//! name, return raw DER bytes". [`KeyVaultClient`] implements that against
//! an Azure-Key-Vault-style REST surface with ambient managed-identity
//! credentials; tests and other platforms can substitute their own
//! [`VaultCertificateSource`].

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

use crate::CheckError;

/// Token audience for vault data-plane requests.
const TOKEN_RESOURCE: &str = "https://vault.azure.net";

/// Vault REST API version used for certificate reads.
const API_VERSION: &str = "7.4";

/// Fetches raw certificate bytes from a secret vault.
#[async_trait]
pub trait VaultCertificateSource: Send + Sync {
    /// Returns the DER-encoded certificate stored under `cert_name`.
    async fn fetch_certificate(
        &self,
        vault_base: &str,
        cert_name: &str,
    ) -> Result<Vec<u8>, CheckError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct VaultCertificateResponse {
    /// Base64-encoded DER certificate.
    cer: String,
}

/// Key-Vault client authenticating with ambient platform credentials:
/// the app-service identity endpoint when `IDENTITY_ENDPOINT` /
/// `IDENTITY_HEADER` are present, the instance metadata service otherwise.
pub struct KeyVaultClient {
    client: reqwest::Client,
}

impl KeyVaultClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn acquire_token(&self) -> Result<String, CheckError> {
        let request = match (
            std::env::var("IDENTITY_ENDPOINT"),
            std::env::var("IDENTITY_HEADER"),
        ) {
            (Ok(endpoint), Ok(header)) => self
                .client
                .get(&endpoint)
                .query(&[("resource", TOKEN_RESOURCE), ("api-version", "2019-08-01")])
                .header("X-IDENTITY-HEADER", header),
            _ => self
                .client
                .get("http://169.254.169.254/metadata/identity/oauth2/token")
                .query(&[("resource", TOKEN_RESOURCE), ("api-version", "2018-02-01")])
                .header("Metadata", "true"),
        };

        let response = request
            .send()
            .await
            .map_err(|e| CheckError::Vault(format!("credential request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CheckError::Vault(format!(
                "credential request returned HTTP {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CheckError::Vault(format!("invalid credential response: {e}")))?;

        Ok(token.access_token)
    }
}

impl Default for KeyVaultClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultCertificateSource for KeyVaultClient {
    async fn fetch_certificate(
        &self,
        vault_base: &str,
        cert_name: &str,
    ) -> Result<Vec<u8>, CheckError> {
        let token = self.acquire_token().await?;

        let url = format!("{vault_base}/certificates/{cert_name}");
        let response = self
            .client
            .get(&url)
            .query(&[("api-version", API_VERSION)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CheckError::Vault(format!("certificate fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CheckError::Vault(format!(
                "certificate fetch for '{cert_name}' returned HTTP {}",
                response.status()
            )));
        }

        let cert: VaultCertificateResponse = response
            .json()
            .await
            .map_err(|e| CheckError::Vault(format!("invalid certificate response: {e}")))?;

        base64::engine::general_purpose::STANDARD
            .decode(cert.cer.as_bytes())
            .map_err(|e| CheckError::Vault(format!("certificate is not valid base64: {e}")))
    }
}
