//! Error types for listener bootstrap and worker supervision.
//!
//! The split mirrors the two startup regimes: [`BootstrapError`] covers the
//! listener path (TLS material resolution and socket binding) and is always
//! fatal to the bootstrap that produced it; [`SupervisorError`] covers worker
//! process creation in the master. Worker *exits* are not errors here — the
//! supervisor absorbs them and respawns.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of the listener-regime bootstrap.
///
/// Exactly one of these reaches the caller's completion callback; in-range
/// address-in-use conditions are retried internally and never surface.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A configured TLS key/certificate/CA file could not be read.
    #[error("failed to read TLS material from {path}: {source}")]
    MaterialLoad {
        /// The path that failed to load.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// TLS material was read but could not be turned into an acceptor.
    #[error("invalid TLS material: {0}")]
    InvalidMaterial(String),

    /// Every port in the configured range was already taken.
    #[error("every port on {address} from {port} through {max_port} is in use")]
    AddressInUse {
        /// Address the probe ran against.
        address: String,
        /// First port of the probed range.
        port: u16,
        /// Last port of the probed range.
        max_port: u16,
    },

    /// A bind failure other than address-in-use. Never retried.
    #[error("failed to bind {address}:{port}: {source}")]
    Bind {
        /// Address of the failed attempt.
        address: String,
        /// Port of the failed attempt.
        port: u16,
        #[source]
        source: io::Error,
    },
}

impl BootstrapError {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            BootstrapError::MaterialLoad { .. } => "material_load",
            BootstrapError::InvalidMaterial(_) => "invalid_material",
            BootstrapError::AddressInUse { .. } => "address_in_use",
            BootstrapError::Bind { .. } => "bind",
        }
    }
}

/// Failures of the supervisor regime.
///
/// Only process *creation* can fail here; once a worker is running, its exit
/// is handled by the restart policy and never propagates.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The worker binary could not be resolved.
    #[error("failed to locate worker binary: {0}")]
    WorkerBinary(#[source] io::Error),

    /// Spawning a worker process failed.
    #[error("failed to spawn worker {id}: {source}")]
    Spawn {
        /// Supervisor-assigned worker id.
        id: u32,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_in_use_names_the_range() {
        let err = BootstrapError::AddressInUse {
            address: "0.0.0.0".to_string(),
            port: 8080,
            max_port: 8090,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("8080"));
        assert!(rendered.contains("8090"));
        assert_eq!(err.as_label(), "address_in_use");
    }

    #[test]
    fn material_load_names_the_path() {
        let err = BootstrapError::MaterialLoad {
            path: PathBuf::from("/etc/tls/server.key"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/etc/tls/server.key"));
    }
}
