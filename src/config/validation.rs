//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check port-range and worker-count invariants
//! - Check TLS mode prerequisites (key/cert paths, CA presence)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the parsed settings
//! - Runs before config is accepted into the system

use crate::config::schema::{SecureMode, Settings};

/// A single semantic validation failure.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Port 0 would ask the OS for an arbitrary port, which defeats the
    /// configured probe range.
    PortZero,
    /// `max_port` is below `port`.
    PortRangeInverted { port: u16, max_port: u16 },
    /// Clustering requested with an explicit worker count of zero.
    NoWorkers,
    /// `file_based` TLS without a private key path.
    MissingKeyPath,
    /// `file_based` TLS without a certificate path.
    MissingCertPath,
    /// Client certificates requested but no CA chain to verify against.
    ClientCertWithoutCa,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::PortZero => write!(f, "server.port must be nonzero"),
            ValidationError::PortRangeInverted { port, max_port } => {
                write!(f, "server.max_port ({max_port}) is below server.port ({port})")
            }
            ValidationError::NoWorkers => {
                write!(f, "server.worker_count must be at least 1 when clustering is enabled")
            }
            ValidationError::MissingKeyPath => {
                write!(f, "server.key_path is required for file_based TLS")
            }
            ValidationError::MissingCertPath => {
                write!(f, "server.cert_path is required for file_based TLS")
            }
            ValidationError::ClientCertWithoutCa => {
                write!(
                    f,
                    "server.request_client_cert requires at least one entry in server.ca_paths"
                )
            }
        }
    }
}

/// Validate the parsed settings, collecting every violation.
pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let server = &settings.server;
    let mut errors = Vec::new();

    if server.port == 0 {
        errors.push(ValidationError::PortZero);
    }

    if let Some(max_port) = server.max_port {
        if max_port < server.port {
            errors.push(ValidationError::PortRangeInverted {
                port: server.port,
                max_port,
            });
        }
    }

    if server.cluster_enabled && server.worker_count == 0 {
        errors.push(ValidationError::NoWorkers);
    }

    if server.secure == SecureMode::FileBased {
        if server.key_path.is_none() {
            errors.push(ValidationError::MissingKeyPath);
        }
        if server.cert_path.is_none() {
            errors.push(ValidationError::MissingCertPath);
        }
    }

    if server.secure.is_secure() && server.request_client_cert && server.ca_paths.is_empty() {
        errors.push(ValidationError::ClientCertWithoutCa);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
