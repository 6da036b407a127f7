//! Configuration schema definitions.
//!
//! This module defines the configuration structure consumed by the startup
//! orchestrator. All types derive Serde traits for deserialization from
//! config files; every field has a default so a minimal (or empty) config
//! is valid.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration document.
///
/// The orchestrator only reads the `server` section; other sections belong
/// to the application embedding it.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Server startup configuration.
    pub server: ServerConfig,
}

/// Server startup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind listeners to.
    pub address: String,

    /// First port to attempt binding.
    pub port: u16,

    /// Upper bound of the port probe, inclusive. Omitted means `port`
    /// itself (no probing past the configured port).
    pub max_port: Option<u16>,

    /// Run a master process that spawns worker processes instead of
    /// listening in-process.
    pub cluster_enabled: bool,

    /// Number of worker processes when clustering is enabled.
    pub worker_count: usize,

    /// How TLS material is obtained for the listener.
    pub secure: SecureMode,

    /// Path to the private key file (PEM). Required for `file_based`.
    pub key_path: Option<PathBuf>,

    /// Path to the certificate file (PEM). Required for `file_based`.
    pub cert_path: Option<PathBuf>,

    /// CA certificate paths, concatenated in order into the trust chain.
    pub ca_paths: CaPaths,

    /// Passphrase carried alongside the private key.
    pub passphrase: Option<String>,

    /// Ask connecting clients for a certificate.
    pub request_client_cert: bool,

    /// Reject clients that present no (or an unverifiable) certificate.
    pub reject_unauthorized: bool,

    /// Maximum concurrent connections accepted by the listener.
    pub max_connections: usize,
}

impl ServerConfig {
    /// Upper bound of the port probe, resolved against its default.
    pub fn effective_max_port(&self) -> u16 {
        self.max_port.unwrap_or(self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
            max_port: None,
            cluster_enabled: false,
            worker_count: default_worker_count(),
            secure: SecureMode::Off,
            key_path: None,
            cert_path: None,
            ca_paths: CaPaths::default(),
            passphrase: None,
            request_client_cert: false,
            reject_unauthorized: true,
            max_connections: 10_000,
        }
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// How TLS material is obtained for secure listeners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecureMode {
    /// Plaintext listener; no TLS material is resolved.
    #[default]
    Off,
    /// Fresh self-signed key+certificate pair generated at startup.
    /// Never persisted; meant for development and ephemeral deployments.
    AutoGenerated,
    /// Key, certificate and CA chain read from the configured paths.
    FileBased,
}

impl SecureMode {
    /// Whether this mode requires TLS material at all.
    pub fn is_secure(&self) -> bool {
        !matches!(self, SecureMode::Off)
    }
}

/// Ordered list of CA certificate paths.
///
/// Some configuration formats misrepresent arrays as objects keyed by
/// stringified indices (`{"0": ..., "1": ...}`). This type accepts both
/// shapes and normalizes the object form by sorting keys numerically, so
/// the ambiguity never reaches the TLS loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CaPaths(Vec<PathBuf>);

impl CaPaths {
    /// Build from an already-ordered list.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self(paths)
    }

    /// Number of configured CA paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no CA paths are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Paths in trust-chain order.
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a CaPaths {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for CaPaths {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Ordered(Vec<PathBuf>),
            Indexed(BTreeMap<String, PathBuf>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Ordered(paths) => Ok(Self(paths)),
            Repr::Indexed(map) => {
                let mut indexed = Vec::with_capacity(map.len());
                for (key, path) in map {
                    let index: u64 = key.parse().map_err(|_| {
                        serde::de::Error::custom(format!(
                            "ca_paths key {key:?} is not a numeric index"
                        ))
                    })?;
                    indexed.push((index, path));
                }
                // BTreeMap orders keys lexicographically ("10" < "2");
                // the chain order must be numeric.
                indexed.sort_by_key(|(index, _)| *index);
                Ok(Self(indexed.into_iter().map(|(_, path)| path).collect()))
            }
        }
    }
}
