//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → stderr (master and workers interleave there)
//! ```
//!
//! # Design Decisions
//! - One structured event per worker state transition and per bind
//!   attempt outcome
//! - stdout is never logged to: in worker processes it carries the
//!   lifecycle pipe protocol

pub mod logging;
