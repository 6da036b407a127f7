//! Shared utilities for integration tests.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use spinup::config::ServerConfig;

/// Hold `count` consecutive ports on `address` open, starting at `start`.
///
/// The returned listeners keep the ports occupied until dropped.
pub async fn occupy_ports(address: &str, start: u16, count: u16) -> Vec<TcpListener> {
    let mut held = Vec::with_capacity(count as usize);
    for offset in 0..count {
        let listener = TcpListener::bind((address, start + offset))
            .await
            .unwrap_or_else(|e| panic!("failed to occupy port {}: {e}", start + offset));
        held.push(listener);
    }
    held
}

/// Loopback config probing `port..=max_port`.
pub fn loopback_config(port: u16, max_port: u16) -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1".to_string(),
        port,
        max_port: Some(max_port),
        ..ServerConfig::default()
    }
}

/// Round-trip one payload through an echo server at `addr`.
#[allow(dead_code)]
pub async fn echo_roundtrip(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.expect("connect to echo");
    stream.write_all(payload).await.expect("write payload");

    let mut received = vec![0u8; payload.len()];
    stream.read_exact(&mut received).await.expect("read echo");
    received
}
