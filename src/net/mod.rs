//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig
//!     → tls.rs (resolve material, build acceptor)
//!     → bootstrap.rs (port probe state machine)
//!     → completion callback (exactly once: bound address or fatal error)
//!     → listener.rs (bounded accept loop)
//!     → handler.rs (application connection handler)
//! ```
//!
//! # Design Decisions
//! - TLS resolution happens before any bind attempt; material failures
//!   abort the bootstrap early
//! - Port retries are invisible to the caller; the completion callback
//!   fires at most once per process lifetime in the listener regime
//! - The handler is opaque; this layer never reads application bytes

pub mod bootstrap;
pub mod handler;
pub mod listener;
pub mod tls;

use std::net::SocketAddr;

use tokio_rustls::TlsAcceptor;

use crate::config::ServerConfig;
use crate::error::BootstrapError;
use crate::lifecycle::Shutdown;

pub use bootstrap::{Bound, BootstrapState, ListenerBootstrap};
pub use handler::{Connection, ConnectionHandler, EchoHandler};
pub use listener::BoundListener;
pub use tls::TlsMaterial;

/// Caller-supplied completion callback.
///
/// Invoked exactly once per listener-regime bootstrap: with the bound
/// address on success, or with the fatal error. The library signals
/// fatality through this callback and its return; it never terminates the
/// process itself.
pub type Completion = Box<dyn FnOnce(Result<SocketAddr, BootstrapError>) + Send>;

/// Run the full listener regime: resolve TLS material, probe the port
/// range, signal completion, then serve connections until shutdown.
///
/// On a fatal bootstrap error the completion callback receives the error
/// and this function returns without having accepted any connection.
pub async fn serve<H: ConnectionHandler>(
    server: &ServerConfig,
    handler: H,
    shutdown: &Shutdown,
    completion: Completion,
) {
    match bootstrap_listener(server).await {
        Ok((bound, tls)) => {
            completion(Ok(bound.local_addr));
            BoundListener::new(bound.listener, server.max_connections, tls)
                .serve(handler, shutdown)
                .await;
        }
        Err(error) => completion(Err(error)),
    }
}

/// Resolve TLS material (if any) and run the bind probe.
async fn bootstrap_listener(
    server: &ServerConfig,
) -> Result<(Bound, Option<TlsAcceptor>), BootstrapError> {
    let material = tls::load_material(server)?;
    let acceptor = match &material {
        Some(material) => Some(tls::build_acceptor(
            material,
            server.request_client_cert,
            server.reject_unauthorized,
        )?),
        None => None,
    };

    let mut bootstrap = ListenerBootstrap::new(
        server.address.clone(),
        server.port,
        server.effective_max_port(),
    );
    let bound = bootstrap.run().await?;

    Ok((bound, acceptor))
}
