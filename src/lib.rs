//! spinup — server-startup orchestration.
//!
//! Given a resolved configuration, brings up one or more network listeners
//! (plaintext or TLS) and, optionally, a pool of worker processes that
//! share listening duty.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────┐
//!   Settings ─────▶│   topology   │── RunAsSupervisor ──▶ cluster::Supervisor
//!                  │   selector   │                         (spawn / track /
//!                  └──────┬───────┘                          restart workers)
//!                         │
//!                  RunAsListener
//!                         │
//!                         ▼
//!                  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!                  │   net::tls   │───▶│net::bootstrap│───▶│net::listener │
//!                  │ (material +  │    │ (port probe  │    │ (bounded     │
//!                  │  acceptor)   │    │  state mach.)│    │  accept loop)│
//!                  └──────────────┘    └──────┬───────┘    └──────┬───────┘
//!                                             │                   │
//!                                     completion callback   ConnectionHandler
//!                                     (exactly once)        (opaque)
//! ```
//!
//! Worker processes are the same binary re-executed with a hidden flag;
//! each runs its own listener bootstrap and reports lifecycle progress to
//! the master over its stdout pipe.

// Core subsystems
pub mod config;
pub mod net;
pub mod topology;

// Cluster supervision
pub mod cluster;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::{load_settings, SecureMode, ServerConfig, Settings};
pub use error::{BootstrapError, SupervisorError};
pub use lifecycle::Shutdown;
pub use net::{serve, Completion, ConnectionHandler, EchoHandler};
pub use topology::{select, ProcessRole, StartupAction};
