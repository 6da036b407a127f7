//! Bounded accept loop over a bootstrapped socket.
//!
//! # Responsibilities
//! - Enforce max_connections limit via semaphore
//! - Perform the TLS handshake per connection when material was resolved
//! - Dispatch each connection to the handler on its own task
//! - Stop accepting when shutdown fires
//!
//! # Design Decisions
//! - Permit acquired before accept (backpressure, not queue growth)
//! - Handshake and handler failures end that connection only
//! - Accept errors are logged and the loop continues

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_rustls::TlsAcceptor;

use crate::lifecycle::Shutdown;
use crate::net::handler::ConnectionHandler;

/// A bound listener with accept-side backpressure.
///
/// When `max_connections` handlers are in flight, new connections wait in
/// the OS accept queue until a slot frees up.
pub struct BoundListener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
    tls: Option<TlsAcceptor>,
}

impl BoundListener {
    /// Wrap a bound socket. `tls` carries the acceptor for secure listeners.
    pub fn new(inner: TcpListener, max_connections: usize, tls: Option<TlsAcceptor>) -> Self {
        Self {
            inner,
            connection_limit: Arc::new(Semaphore::new(max_connections.max(1))),
            tls,
        }
    }

    /// Accept and dispatch connections until shutdown fires.
    pub async fn serve<H: ConnectionHandler>(self, handler: H, shutdown: &Shutdown) {
        loop {
            let permit = tokio::select! {
                permit = self.connection_limit.clone().acquire_owned() => {
                    match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    }
                }
                () = shutdown.triggered() => break,
            };

            let accepted = tokio::select! {
                accepted = self.inner.accept() => accepted,
                () = shutdown.triggered() => break,
            };

            match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(
                        peer = %peer,
                        available_permits = self.connection_limit.available_permits(),
                        "Connection accepted"
                    );
                    let tls = self.tls.clone();
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        match tls {
                            Some(acceptor) => match acceptor.accept(stream).await {
                                Ok(stream) => handler.handle(Box::new(stream), peer).await,
                                Err(error) => {
                                    tracing::debug!(
                                        peer = %peer,
                                        error = %error,
                                        "TLS handshake failed"
                                    );
                                }
                            },
                            None => handler.handle(Box::new(stream), peer).await,
                        }
                    });
                }
                Err(error) => {
                    tracing::error!(error = %error, "Accept failed");
                }
            }
        }

        tracing::info!("Listener stopped");
    }

    /// Remaining connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }
}
