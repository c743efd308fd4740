//! Router fixtures: state builders, request helpers, and a raw chunked upstream.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use downloader_api::{
    AddressChecker, ApiKeys, AppState, Database, GuardedClient, HostResolver, MemoryKv,
    NoteStore, StaticResolver, TransferLimits, router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

/// Address a documentation host resolves to; counts as public.
pub const PUBLIC_ADDR: &str = "93.184.216.34";

/// Resolves `internal.test` to a private address and everything else to [`PUBLIC_ADDR`].
#[derive(Debug)]
pub struct SplitResolver;

#[async_trait]
impl HostResolver for SplitResolver {
    async fn resolve(&self, host: &str, _port: u16) -> std::io::Result<Vec<IpAddr>> {
        let addr = if host == "internal.test" {
            "10.0.0.7"
        } else {
            PUBLIC_ADDR
        };
        Ok(vec![addr.parse().map_err(std::io::Error::other)?])
    }
}

/// Client that treats every host (including the local mock server) as public.
pub fn public_client() -> GuardedClient {
    let addr: IpAddr = PUBLIC_ADDR.parse().unwrap();
    GuardedClient::new(AddressChecker::new(Arc::new(StaticResolver::new(vec![addr])))).unwrap()
}

pub fn split_client() -> GuardedClient {
    GuardedClient::new(AddressChecker::new(Arc::new(SplitResolver))).unwrap()
}

pub fn limits(max_bytes: u64) -> TransferLimits {
    TransferLimits {
        max_bytes,
        ..TransferLimits::default()
    }
}

/// State without a notes database and without API keys.
pub fn state_with(client: GuardedClient, limits: TransferLimits) -> AppState {
    AppState::new(
        client,
        limits,
        Arc::new(MemoryKv::new()),
        None,
        ApiKeys::default(),
    )
}

/// State with an in-memory notes database and the given API keys.
pub async fn full_state(keys: &[&str]) -> AppState {
    let notes = NoteStore::new(Database::new_in_memory().await.unwrap());
    AppState::new(
        public_client(),
        TransferLimits::default(),
        Arc::new(MemoryKv::new()),
        Some(notes),
        ApiKeys::new(keys.iter().copied()),
    )
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Sends one request through the router and buffers the whole body.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

/// JSON request with an optional `x-api-key`.
pub fn json_request(
    method: &str,
    uri: &str,
    body: &serde_json::Value,
    api_key: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn keyed_request(method: &str, uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn app(state: AppState) -> Router {
    router(state)
}

/// Upstream that answers `GET` with a chunked body (no `Content-Length`)
/// and `HEAD` with 405. Serves connections until the test ends.
pub async fn spawn_chunked_upstream(chunks: Vec<Vec<u8>>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let chunks = Arc::new(chunks);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let chunks = Arc::clone(&chunks);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                if request.starts_with(b"HEAD") {
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 405 Method Not Allowed\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                    return;
                }

                let head = b"HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n";
                if socket.write_all(head).await.is_err() {
                    return;
                }
                for chunk in chunks.iter() {
                    let frame = format!("{:x}\r\n", chunk.len());
                    if socket.write_all(frame.as_bytes()).await.is_err()
                        || socket.write_all(chunk).await.is_err()
                        || socket.write_all(b"\r\n").await.is_err()
                    {
                        return;
                    }
                }
                let _ = socket.write_all(b"0\r\n\r\n").await;
            });
        }
    });

    addr
}
