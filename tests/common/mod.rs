//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::Value;
use stashbox::{GatewayServer, MountTable, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A gateway running on an ephemeral local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway serving `mounts` (a JSON array of mount entries).
pub async fn start_gateway(mounts: Value) -> TestGateway {
    start_gateway_with_limit(mounts, 2 * 1024 * 1024).await
}

#[allow(dead_code)]
pub async fn start_gateway_with_limit(mounts: Value, max_body_size: usize) -> TestGateway {
    let entries = mounts.as_array().cloned().unwrap_or_default();
    let table = MountTable::from_entries(&entries).unwrap();
    let server = GatewayServer::with_mounts(table, max_body_size);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestGateway { addr, shutdown }
}

/// Start a mock upstream that answers every request with its request
/// line and `Host` header, e.g. `GET /v1/users?page=2 HTTP/1.1|host: 127.0.0.1:4000`.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]).to_string();
                        let mut lines = head.lines();
                        let request_line = lines.next().unwrap_or_default().to_string();
                        let host = lines
                            .find(|line| line.to_ascii_lowercase().starts_with("host:"))
                            .map(|line| line.to_ascii_lowercase())
                            .unwrap_or_default();
                        let body = format!("{request_line}|{host}");

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nX-Upstream: echo\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
