//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, at process startup
//! - Honour `RUST_LOG` over the built-in default filter
//!
//! # Design Decisions
//! - Structured fields over message interpolation
//! - Workers inherit the master's stderr, so their logs interleave there
//!   while stdout stays reserved for lifecycle messages

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset.
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
