//! Connection handler seam.
//!
//! The orchestrator hands accepted streams (plaintext or TLS-wrapped) to a
//! handler and never interprets application traffic itself.

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Byte stream of one accepted connection, plaintext or TLS.
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Connection for T {}

/// Application-level consumer of accepted connections.
///
/// One handler instance serves the whole listener; it is cloned per
/// connection and each clone runs on its own task.
pub trait ConnectionHandler: Clone + Send + Sync + 'static {
    /// Handle one connection to completion.
    fn handle(
        self,
        stream: Box<dyn Connection>,
        peer: SocketAddr,
    ) -> impl Future<Output = ()> + Send;
}

/// Echoes received bytes back to the peer.
///
/// The binary's default handler; also exercises TLS-wrapped streams in
/// tests without an application protocol on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl ConnectionHandler for EchoHandler {
    async fn handle(self, mut stream: Box<dyn Connection>, peer: SocketAddr) {
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if let Err(error) = stream.write_all(&buf[..n]).await {
                        tracing::debug!(peer = %peer, error = %error, "Echo write failed");
                        break;
                    }
                }
                Err(error) => {
                    tracing::debug!(peer = %peer, error = %error, "Echo read failed");
                    break;
                }
            }
        }
    }
}
