//! TLS client configuration.
//!
//! Certificate checking is a policy choice. `TlsPolicy::AcceptInvalidCerts`
//! (the default) completes the handshake with any server certificate, which
//! leaves connections open to interception. `TlsPolicy::Verify` checks the
//! chain against the bundled webpki roots.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use textweb_core::Error;

/// Server certificate trust policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Skip certificate and hostname validation.
    #[default]
    AcceptInvalidCerts,
    /// Validate against the webpki root store.
    Verify,
}

impl TlsPolicy {
    pub fn from_accept_invalid(accept_invalid_certs: bool) -> Self {
        if accept_invalid_certs { TlsPolicy::AcceptInvalidCerts } else { TlsPolicy::Verify }
    }
}

/// Verifier that accepts every certificate but still checks handshake
/// signatures, so the session keys belong to whoever presented the cert.
#[derive(Debug)]
struct AcceptAnyCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self, _end_entity: &CertificateDer<'_>, _intermediates: &[CertificateDer<'_>], _server_name: &ServerName<'_>,
        _ocsp_response: &[u8], _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self, message: &[u8], cert: &CertificateDer<'_>, dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self, message: &[u8], cert: &CertificateDer<'_>, dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

/// Build a rustls client config for the given policy.
///
/// Uses the ring provider explicitly so no process-wide default has to be
/// installed first.
pub fn client_config(policy: TlsPolicy) -> Result<Arc<ClientConfig>, Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Connection(format!("failed to configure TLS: {e}")))?;

    let config = match policy {
        TlsPolicy::AcceptInvalidCerts => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert { provider }))
            .with_no_client_auth(),
        TlsPolicy::Verify => {
            let mut root_store = RootCertStore::empty();
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder.with_root_certificates(root_store).with_no_client_auth()
        }
    };

    Ok(Arc::new(config))
}
