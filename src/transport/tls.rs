//! rustls client configuration shared by both connectors.
//!
//! With verification on, the trust store is the platform's native roots
//! (falling back to the Mozilla roots from webpki-roots when none load),
//! plus any configured CA bundle or directory. With verification off, any
//! certificate is accepted and SNI is not sent.

use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::config::TlsConfig;
use crate::error::{Error, Result};

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Builds the client configuration for `config`.
pub fn client_config(config: &TlsConfig) -> Result<Arc<ClientConfig>> {
    let provider = provider();
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?;

    let mut client = if config.verify {
        builder
            .with_root_certificates(build_root_store(config)?)
            .with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerification(provider)))
            .with_no_client_auth()
    };

    client.enable_sni = config.verify;
    client.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(Arc::new(client))
}

fn build_root_store(config: &TlsConfig) -> Result<RootCertStore> {
    let mut root_store = RootCertStore::empty();

    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            let (added, ignored) = root_store.add_parsable_certificates(certs);
            tracing::trace!(added, ignored, "loaded native root certificates");
        }
        Err(e) => tracing::debug!(error = %e, "failed to load native root certificates"),
    }
    if root_store.is_empty() {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    if let Some(file) = &config.ca_file {
        add_pem_file(&mut root_store, file)?;
    }

    if let Some(dir) = &config.ca_path {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::Tls(format!("cannot read CA directory {}: {e}", dir.display())))?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_cert = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "pem" | "crt" | "cer"));
            if is_cert {
                add_pem_file(&mut root_store, &path)?;
            }
        }
    }

    Ok(root_store)
}

fn add_pem_file(root_store: &mut RootCertStore, path: &Path) -> Result<()> {
    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|e| Error::Tls(format!("cannot read CA file {}: {e}", path.display())))?;

    for cert in certs {
        let cert = cert.map_err(|e| Error::Tls(format!("invalid PEM in {}: {e}", path.display())))?;
        root_store
            .add(cert)
            .map_err(|e| Error::Tls(format!("invalid CA certificate in {}: {e}", path.display())))?;
    }

    Ok(())
}

/// Server name for the handshake.
pub fn server_name(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|_| Error::Tls(format!("invalid server name `{host}`")))
}

/// Accepts every certificate while still checking handshake signatures.
#[derive(Debug)]
struct NoVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
