//! Loopback stand-ins for public proxies, used by the unit tests

use crate::proxy::models::Candidate;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Canary URL used in tests; only the fake proxy ever sees it
pub const CANARY_URL: &str = "http://canary.invalid/stt.con";

#[derive(Debug, Clone)]
enum Behavior {
    Respond(String),
    DropFirst(String),
    Hang,
}

/// A forward proxy on 127.0.0.1 that answers every request itself
pub struct FakeProxy {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
}

impl FakeProxy {
    /// Answers every request with `body`
    pub async fn respond(body: &str) -> Self {
        Self::spawn(Behavior::Respond(body.to_string())).await
    }

    /// Closes the first connection without answering, then behaves like `respond`
    pub async fn drop_first(body: &str) -> Self {
        Self::spawn(Behavior::DropFirst(body.to_string())).await
    }

    /// Accepts connections and never answers
    pub async fn hang() -> Self {
        Self::spawn(Behavior::Hang).await
    }

    pub fn candidate(&self) -> Candidate {
        Candidate::new(self.addr.ip().to_string(), self.addr.port().to_string())
    }

    pub fn line(&self) -> String {
        self.candidate().key()
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    async fn spawn(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let seen = counter.fetch_add(1, Ordering::SeqCst);
                let behavior = behavior.clone();
                tokio::spawn(serve(socket, behavior, seen));
            }
        });

        Self { addr, connections }
    }
}

async fn serve(mut socket: TcpStream, behavior: Behavior, seen: usize) {
    read_request_head(&mut socket).await;
    match behavior {
        Behavior::Respond(body) => write_response(&mut socket, &body).await,
        Behavior::DropFirst(body) => {
            if seen > 0 {
                write_response(&mut socket, &body).await;
            }
        }
        Behavior::Hang => tokio::time::sleep(Duration::from_secs(30)).await,
    }
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

async fn write_response(socket: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// A candidate pointing at a loopback port nothing listens on
pub async fn refused_candidate() -> Candidate {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Candidate::new(addr.ip().to_string(), addr.port().to_string())
}
