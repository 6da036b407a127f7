//! TLS material resolution and acceptor assembly.
//!
//! # Responsibilities
//! - Resolve key/certificate/CA bytes per the configured secure mode
//! - Generate ephemeral self-signed pairs for development deployments
//! - Assemble the rustls acceptor, including client-certificate policy
//!
//! # Design Decisions
//! - Material is raw bytes end to end; PEM parsing happens only at
//!   acceptor assembly
//! - Any unreadable path fails the whole bootstrap before a bind attempt;
//!   no partial material is ever returned
//! - An empty CA chain is omitted entirely, never passed as an empty list

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::RootCertStore;
use tokio_rustls::TlsAcceptor;

use crate::config::{SecureMode, ServerConfig};
use crate::error::BootstrapError;

/// Resolved key, certificate and CA chain for one secure listener.
///
/// Immutable once constructed; owned by the bootstrap that requested it.
#[derive(Clone)]
pub struct TlsMaterial {
    /// Private key bytes (PEM).
    pub private_key: Vec<u8>,
    /// Certificate bytes (PEM).
    pub certificate: Vec<u8>,
    /// CA certificates in trust-chain order, one file's bytes per entry.
    pub ca_chain: Vec<Vec<u8>>,
    /// Passphrase configured alongside the key, carried opaquely.
    pub passphrase: Option<String>,
}

// Key bytes stay out of debug output.
impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("private_key_len", &self.private_key.len())
            .field("certificate_len", &self.certificate.len())
            .field("ca_chain_entries", &self.ca_chain.len())
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Resolve TLS material for the configured secure mode.
///
/// Returns `None` for plaintext listeners.
pub fn load_material(server: &ServerConfig) -> Result<Option<TlsMaterial>, BootstrapError> {
    match server.secure {
        SecureMode::Off => Ok(None),
        SecureMode::AutoGenerated => generate_self_signed(server).map(Some),
        SecureMode::FileBased => load_from_files(server).map(Some),
    }
}

/// Generate a fresh self-signed pair. The pair lives only in memory.
fn generate_self_signed(server: &ServerConfig) -> Result<TlsMaterial, BootstrapError> {
    let subject_alt_names = vec![server.address.clone(), "localhost".to_string()];
    let certified = rcgen::generate_simple_self_signed(subject_alt_names).map_err(|e| {
        BootstrapError::InvalidMaterial(format!("self-signed generation failed: {e}"))
    })?;

    tracing::debug!(address = %server.address, "Generated self-signed TLS material");

    Ok(TlsMaterial {
        private_key: certified.key_pair.serialize_pem().into_bytes(),
        certificate: certified.cert.pem().into_bytes(),
        ca_chain: Vec::new(),
        passphrase: server.passphrase.clone(),
    })
}

fn load_from_files(server: &ServerConfig) -> Result<TlsMaterial, BootstrapError> {
    let key_path = server
        .key_path
        .as_deref()
        .ok_or_else(|| BootstrapError::InvalidMaterial("key_path is not configured".into()))?;
    let cert_path = server
        .cert_path
        .as_deref()
        .ok_or_else(|| BootstrapError::InvalidMaterial("cert_path is not configured".into()))?;

    let private_key = read_material(key_path)?;
    let certificate = read_material(cert_path)?;

    let mut ca_chain = Vec::with_capacity(server.ca_paths.len());
    for path in &server.ca_paths {
        ca_chain.push(read_material(path)?);
    }

    tracing::debug!(
        key_path = %key_path.display(),
        cert_path = %cert_path.display(),
        ca_entries = ca_chain.len(),
        "Loaded TLS material from files"
    );

    Ok(TlsMaterial {
        private_key,
        certificate,
        ca_chain,
        passphrase: server.passphrase.clone(),
    })
}

fn read_material(path: &Path) -> Result<Vec<u8>, BootstrapError> {
    std::fs::read(path).map_err(|source| BootstrapError::MaterialLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the TLS acceptor the listener wraps accepted streams with.
///
/// Client certificates are only verified when requested *and* a CA chain is
/// present; `reject_unauthorized` decides whether certificate-less clients
/// complete the handshake.
pub fn build_acceptor(
    material: &TlsMaterial,
    request_client_cert: bool,
    reject_unauthorized: bool,
) -> Result<TlsAcceptor, BootstrapError> {
    let certs = parse_certs(&material.certificate)?;
    let key = parse_private_key(&material.private_key)?;

    let builder = if request_client_cert && !material.ca_chain.is_empty() {
        let verifier = client_verifier(&material.ca_chain, reject_unauthorized)?;
        rustls::ServerConfig::builder().with_client_cert_verifier(verifier)
    } else {
        rustls::ServerConfig::builder().with_no_client_auth()
    };

    let config = builder.with_single_cert(certs, key).map_err(|e| {
        BootstrapError::InvalidMaterial(format!("certificate/key pair rejected: {e}"))
    })?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn parse_certs(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, BootstrapError> {
    let mut cursor: &[u8] = pem;
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cursor)
        .collect::<Result<_, _>>()
        .map_err(|e| BootstrapError::InvalidMaterial(format!("malformed certificate PEM: {e}")))?;

    if certs.is_empty() {
        return Err(BootstrapError::InvalidMaterial(
            "no certificates found in PEM input".into(),
        ));
    }

    Ok(certs)
}

fn parse_private_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, BootstrapError> {
    let mut cursor: &[u8] = pem;
    rustls_pemfile::private_key(&mut cursor)
        .map_err(|e| BootstrapError::InvalidMaterial(format!("malformed private key PEM: {e}")))?
        .ok_or_else(|| {
            BootstrapError::InvalidMaterial("no private key found in PEM input".into())
        })
}

fn client_verifier(
    ca_chain: &[Vec<u8>],
    reject_unauthorized: bool,
) -> Result<Arc<dyn rustls::server::danger::ClientCertVerifier>, BootstrapError> {
    let mut roots = RootCertStore::empty();
    for pem in ca_chain {
        for cert in parse_certs(pem)? {
            roots.add(cert).map_err(|e| {
                BootstrapError::InvalidMaterial(format!("CA certificate rejected: {e}"))
            })?;
        }
    }

    let builder = WebPkiClientVerifier::builder(Arc::new(roots));
    let builder = if reject_unauthorized {
        builder
    } else {
        builder.allow_unauthenticated()
    };

    builder
        .build()
        .map_err(|e| BootstrapError::InvalidMaterial(format!("client verifier rejected: {e}")))
}
