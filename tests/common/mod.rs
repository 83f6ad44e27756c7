//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use caching_proxy::config::ProxyConfig;
use caching_proxy::http::{ProxyServer, ProxyState};
use caching_proxy::lifecycle::Shutdown;
use caching_proxy::net::Listener;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// A mock origin that answers every connection with the same bytes.
pub struct MockOrigin {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockOrigin {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Header blocks received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Build an HTTP/1.0 200 response carrying `body`.
pub fn ok_response(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

/// Start a mock origin on an ephemeral port.
pub async fn start_origin(response: Vec<u8>) -> MockOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let response = Arc::new(response);

    {
        let connections = Arc::clone(&connections);
        let requests = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                connections.fetch_add(1, Ordering::SeqCst);
                let requests = Arc::clone(&requests);
                let response = Arc::clone(&response);
                tokio::spawn(async move {
                    let (rd, mut wr) = socket.into_split();
                    let mut reader = BufReader::new(rd);
                    let mut block = String::new();
                    loop {
                        let mut line = String::new();
                        match reader.read_line(&mut line).await {
                            Ok(0) | Err(_) => break,
                            Ok(_) => {
                                block.push_str(&line);
                                if line == "\r\n" {
                                    break;
                                }
                            }
                        }
                    }
                    requests.lock().unwrap().push(block);
                    let _ = wr.write_all(&response).await;
                    let _ = wr.shutdown().await;
                });
            }
        });
    }

    MockOrigin {
        addr,
        connections,
        requests,
    }
}

/// A running proxy bound to an ephemeral loopback port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub state: Arc<ProxyState>,
    pub shutdown: Shutdown,
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let listener = Listener::from_tcp(
        TcpListener::bind("127.0.0.1:0").await.unwrap(),
        config.listener.max_connections,
    );
    let addr = listener.local_addr().unwrap();
    let server = ProxyServer::new(&config);
    let state = server.state();
    let shutdown = Shutdown::new();

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        state,
        shutdown,
    }
}

/// Send raw bytes to the proxy and read until it closes the connection.
pub async fn raw_request(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("proxy should close the connection")
        .unwrap();
    response
}

/// Origin-form GET with a Host header pointing at `origin`.
pub fn get_request(origin: SocketAddr, path: &str) -> Vec<u8> {
    format!("GET {} HTTP/1.0\r\nHost: {}\r\n\r\n", path, origin).into_bytes()
}

/// Absolute-form GET naming `origin`.
pub fn absolute_get(origin: SocketAddr, path: &str) -> Vec<u8> {
    format!("GET http://{}{} HTTP/1.0\r\n\r\n", origin, path).into_bytes()
}
