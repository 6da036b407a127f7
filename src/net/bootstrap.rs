//! Listener bootstrap state machine.
//!
//! # Data Flow
//! ```text
//! ServerConfig (address, port, max_port)
//!     → bind attempt on (address, port)
//!     → success: Listening, done
//!     → address in use, port < max_port: RetryPending → next port
//!     → address in use, port >= max_port: Failed (range exhausted)
//!     → any other error: Failed immediately
//! ```
//!
//! # Design Decisions
//! - Linear upward probe, one attempt in flight at a time, no backoff
//! - Only address-in-use is retryable; everything else is fatal
//! - Retries are internal; callers observe a single success or failure

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::error::BootstrapError;

/// States of one bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Not yet started.
    Idle,
    /// A bind attempt is in flight.
    Binding,
    /// The last attempt hit address-in-use with range left to probe.
    RetryPending,
    /// Bound and listening. Terminal success.
    Listening,
    /// Fatal error. Terminal.
    Failed,
}

/// One in-flight probe over the configured port range.
///
/// Transient: lives only for the duration of a single [`ListenerBootstrap::run`]
/// call; each retry advances `port` and `attempts` in place.
#[derive(Debug)]
struct BindAttempt {
    address: String,
    port: u16,
    attempts: u32,
}

/// A successfully bound listening socket.
#[derive(Debug)]
pub struct Bound {
    /// The listening socket, ready for its accept loop.
    pub listener: TcpListener,
    /// The address the socket actually bound to.
    pub local_addr: SocketAddr,
    /// Number of bind attempts performed, including the successful one.
    pub attempts: u32,
}

/// Binds `address` starting at `port`, probing upward through `max_port`
/// past ports that are already taken.
#[derive(Debug)]
pub struct ListenerBootstrap {
    address: String,
    port: u16,
    max_port: u16,
    state: BootstrapState,
    attempts: u32,
}

impl ListenerBootstrap {
    /// Create a bootstrap for the given range. A `max_port` below `port`
    /// is clamped to `port`.
    pub fn new(address: impl Into<String>, port: u16, max_port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            max_port: max_port.max(port),
            state: BootstrapState::Idle,
            attempts: 0,
        }
    }

    /// Current state of the sequence.
    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Bind attempts performed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run the probe to completion. The sole success exit is a bound socket;
    /// every error return is fatal to this bootstrap.
    pub async fn run(&mut self) -> Result<Bound, BootstrapError> {
        let mut attempt = BindAttempt {
            address: self.address.clone(),
            port: self.port,
            attempts: 0,
        };

        loop {
            self.state = BootstrapState::Binding;
            attempt.attempts += 1;
            self.attempts = attempt.attempts;

            match TcpListener::bind((attempt.address.as_str(), attempt.port)).await {
                Ok(listener) => {
                    let local_addr = match listener.local_addr() {
                        Ok(addr) => addr,
                        Err(source) => {
                            self.state = BootstrapState::Failed;
                            return Err(BootstrapError::Bind {
                                address: attempt.address,
                                port: attempt.port,
                                source,
                            });
                        }
                    };
                    self.state = BootstrapState::Listening;
                    tracing::info!(
                        address = %local_addr,
                        attempts = attempt.attempts,
                        "Listener bound"
                    );
                    return Ok(Bound {
                        listener,
                        local_addr,
                        attempts: attempt.attempts,
                    });
                }
                Err(source) if source.kind() == io::ErrorKind::AddrInUse => {
                    if attempt.port >= self.max_port {
                        self.state = BootstrapState::Failed;
                        tracing::error!(
                            address = %attempt.address,
                            port = self.port,
                            max_port = self.max_port,
                            attempts = attempt.attempts,
                            "Every port in range is in use"
                        );
                        return Err(BootstrapError::AddressInUse {
                            address: attempt.address,
                            port: self.port,
                            max_port: self.max_port,
                        });
                    }
                    self.state = BootstrapState::RetryPending;
                    tracing::debug!(
                        address = %attempt.address,
                        port = attempt.port,
                        next_port = attempt.port + 1,
                        "Port in use, probing next"
                    );
                    attempt.port += 1;
                }
                Err(source) => {
                    self.state = BootstrapState::Failed;
                    tracing::error!(
                        address = %attempt.address,
                        port = attempt.port,
                        error = %source,
                        "Bind failed"
                    );
                    return Err(BootstrapError::Bind {
                        address: attempt.address,
                        port: attempt.port,
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_with_no_attempts() {
        let bootstrap = ListenerBootstrap::new("127.0.0.1", 8080, 8090);
        assert_eq!(bootstrap.state(), BootstrapState::Idle);
        assert_eq!(bootstrap.attempts(), 0);
    }

    #[test]
    fn max_port_below_port_is_clamped() {
        let bootstrap = ListenerBootstrap::new("127.0.0.1", 8080, 1);
        // A single-attempt range, not an empty one.
        assert_eq!(bootstrap.max_port, 8080);
    }

    #[tokio::test]
    async fn unresolvable_address_fails_fatally_on_first_attempt() {
        let mut bootstrap = ListenerBootstrap::new("definitely-not-a-host.invalid", 8080, 8090);
        let err = bootstrap.run().await.unwrap_err();
        assert!(matches!(err, BootstrapError::Bind { .. }));
        assert_eq!(bootstrap.state(), BootstrapState::Failed);
        assert_eq!(bootstrap.attempts(), 1);
    }
}
