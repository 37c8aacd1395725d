//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use admin_gateway::client::ClientContext;
use admin_gateway::config::{ClassifierConfig, GatewayConfig};
use admin_gateway::effects::{ErrorState, History, Toaster};
use admin_gateway::http::{GatewayServer, SharedRoutes};
use admin_gateway::lifecycle::Shutdown;
use admin_gateway::resilience::{ClassifyMode, Dispatcher, ErrorClassifier, RetryPolicy, Sleeper};
use admin_gateway::session::{MemoryStorage, SessionStore, User};

pub const TOKEN: &str = "tok-1";
pub const INDEX: &str = "adm-7";

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Handler = dyn Fn(usize, &RecordedRequest) -> (u16, String) + Send + Sync;

/// A programmable HTTP/1.1 backend on an ephemeral port.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    /// `handler` gets the zero-based hit number and the request.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(usize, &RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let backend = Self {
            addr,
            requests: Arc::default(),
            hits: Arc::default(),
        };

        let handler: Arc<Handler> = Arc::new(handler);
        let state = backend.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((mut socket, _)) => {
                        let handler = handler.clone();
                        let state = state.clone();
                        tokio::spawn(async move {
                            let Some(request) = read_request(&mut socket).await else {
                                return;
                            };
                            let hit = state.hits.fetch_add(1, Ordering::SeqCst);
                            state.requests.lock().unwrap().push(request.clone());
                            let (status, body) = handler(hit, &request);
                            let response = format!(
                                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                status_line(status),
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

        backend
    }

    /// Always answers `status` with `body`.
    pub async fn fixed(status: u16, body: &'static str) -> Self {
        Self::start(move |_, _| (status, body.to_string())).await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn status_line(status: u16) -> String {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        419 => "Page Expired",
        420 => "Enhance Your Calm",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    format!("{} {}", status, reason)
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Run a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, SharedRoutes, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config).unwrap();
    let routes = server.routes();
    let shutdown = Shutdown::new();

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, routes, shutdown)
}

/// Skips the retry delay.
#[derive(Debug)]
pub struct NoDelay;

impl Sleeper for NoDelay {
    fn sleep(&self, _delay: Duration) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

/// Service-client wiring with observable effects.
pub struct Harness {
    pub storage: Arc<MemoryStorage>,
    pub session: Arc<SessionStore>,
    pub toaster: Arc<Toaster>,
    pub history: Arc<History>,
    pub errors: Arc<ErrorState>,
    pub ctx: Arc<ClientContext>,
}

impl Harness {
    /// A verified session for `TOKEN`/`INDEX`, pointed at `base_url`.
    pub fn signed_in(base_url: &str, mode: ClassifyMode, attempts: u32) -> Self {
        let harness = Self::signed_out(base_url, mode, attempts);
        harness.session.restore(
            TOKEN,
            User {
                index: INDEX.to_string(),
                email: "ops@school.example".to_string(),
                ..User::default()
            },
        );
        harness
    }

    pub fn signed_out(base_url: &str, mode: ClassifyMode, attempts: u32) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let history = Arc::new(History::new("/dashboard"));
        let session = Arc::new(SessionStore::new(storage.clone(), history.clone()));
        let toaster = Arc::new(Toaster::new());
        let errors = Arc::new(ErrorState::new());

        let classifier = ErrorClassifier::new(
            session.clone(),
            toaster.clone(),
            history.clone(),
            errors.clone(),
        )
        .with_config(ClassifierConfig {
            mode,
            ..ClassifierConfig::default()
        });

        let dispatcher = Dispatcher::new(RetryPolicy::new(attempts, Duration::from_millis(1000)))
            .with_sleeper(Arc::new(NoDelay));
        let ctx = ClientContext::new(
            reqwest::Client::new(),
            Url::parse(base_url).unwrap(),
            session.clone(),
            classifier,
        )
        .with_dispatcher(dispatcher);

        Self {
            storage,
            session,
            toaster,
            history,
            errors,
            ctx: Arc::new(ctx),
        }
    }
}
