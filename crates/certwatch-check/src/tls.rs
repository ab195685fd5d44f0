use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

use crate::CheckError;

/// Accepts any presented chain. The check service audits the certificate's
/// own trust data (issuer, dates, signature); rejecting untrusted chains at
/// the handshake would hide exactly the certificates it must report on.
#[derive(Debug)]
struct ReportOnlyVerifier;

impl ServerCertVerifier for ReportOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Performs a TLS handshake with the first contacted server and returns the
/// owned peer chain (leaf first) and the negotiated protocol version.
/// Redirects never happen at this layer, so the audited certificate is
/// always the one presented by the configured endpoint.
pub(crate) async fn fetch_peer_chain(
    host: &str,
    port: u16,
    timeout_secs: u64,
) -> Result<(Vec<CertificateDer<'static>>, u16), CheckError> {
    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(ReportOnlyVerifier))
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let server_name =
        ServerName::try_from(host.to_string()).map_err(|e| CheckError::InvalidUrl {
            url: host.to_string(),
            reason: format!("invalid server name: {e}"),
        })?;

    let addr = format!("{host}:{port}");
    let tcp = timeout(Duration::from_secs(timeout_secs), TcpStream::connect(&addr))
        .await
        .map_err(|_| CheckError::Connect {
            host: host.to_string(),
            reason: format!("connection timed out after {timeout_secs}s"),
        })?
        .map_err(|e| CheckError::Connect {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

    let tls_stream = timeout(
        Duration::from_secs(timeout_secs),
        connector.connect(server_name, tcp),
    )
    .await
    .map_err(|_| CheckError::Handshake {
        host: host.to_string(),
        reason: format!("handshake timed out after {timeout_secs}s"),
    })?
    .map_err(|e| CheckError::Handshake {
        host: host.to_string(),
        reason: e.to_string(),
    })?;

    let (_, conn) = tls_stream.get_ref();

    let tls_version = conn.protocol_version().map(u16::from).unwrap_or(0);

    let certs = conn.peer_certificates().ok_or_else(|| CheckError::Handshake {
        host: host.to_string(),
        reason: "no peer certificates".into(),
    })?;

    if certs.is_empty() {
        return Err(CheckError::Handshake {
            host: host.to_string(),
            reason: "empty certificate chain".into(),
        });
    }

    let chain = certs.iter().map(|c| c.clone().into_owned()).collect();
    Ok((chain, tls_version))
}
