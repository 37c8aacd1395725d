//! HTTP server setup and request forwarding.
//!
//! # Responsibilities
//! - Create the Axum router: gateway endpoints plus a proxy fallback
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Resolve the service prefix and forward to its upstream
//! - Swap the route table when a reloaded config arrives
//! - Record per-request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::request::request_id;
use crate::http::response::{error_response, strip_hop_by_hop};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{RouteError, ServiceRouter};

pub const HEALTH_PATH: &str = "/_gateway/health";
pub const ROUTES_PATH: &str = "/_gateway/routes";

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Route table shared between the handlers and the reload task.
pub type SharedRoutes = Arc<ArcSwap<ServiceRouter>>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: SharedRoutes,
    pub client: Client<HttpConnector, Body>,
    pub started: Instant,
}

/// The API gateway: one listener fronting every backend service.
pub struct GatewayServer {
    router: Router,
    routes: SharedRoutes,
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Result<Self, RouteError> {
        let routes: SharedRoutes = Arc::new(ArcSwap::from_pointee(ServiceRouter::from_config(
            &config.services,
        )?));

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            routes: routes.clone(),
            client,
            started: Instant::now(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            routes,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(HEALTH_PATH, get(health_handler))
            .route(ROUTES_PATH, get(routes_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            uri = %req.uri(),
                            request_id = %request_id(req.headers()),
                        )
                    }))
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Handle for swapping the route table from outside the server.
    pub fn routes(&self) -> SharedRoutes {
        self.routes.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The Axum router, for serving on a custom listener or in tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until `shutdown` is triggered, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.routes.load().len(),
            "Gateway listening"
        );

        let token = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Apply one reloaded config. An invalid route table keeps the current one.
pub fn apply_reload(routes: &ArcSwap<ServiceRouter>, config: &GatewayConfig) -> bool {
    match ServiceRouter::from_config(&config.services) {
        Ok(router) => {
            tracing::info!(services = router.len(), "Route table reloaded");
            routes.store(Arc::new(router));
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Reloaded config rejected, keeping current routes");
            false
        }
    }
}

/// Consume reloaded configs until the watcher goes away.
pub fn spawn_reload_task(
    routes: SharedRoutes,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            apply_reload(&routes, &config);
        }
    })
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "services": state.routes.load().len(),
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}

async fn routes_handler(State(state): State<AppState>) -> impl IntoResponse {
    let routes = state.routes.load();
    let table: Vec<_> = routes
        .routes()
        .map(|(name, prefix, upstream)| {
            json!({ "name": name, "prefix": prefix, "upstream": upstream.as_str() })
        })
        .collect();
    Json(table)
}

/// Forward a request to the service owning its path prefix.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let matched = state
        .routes
        .load()
        .match_path(&path, request.uri().query());
    let Some(matched) = matched else {
        tracing::warn!(request_id = %request_id, path = %path, "No service for path");
        metrics::record_proxy_request(&method, 404, "none", start_time);
        return error_response(StatusCode::NOT_FOUND, "no service matches this path", &request_id);
    };

    let uri = match Uri::try_from(matched.target.as_str()) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, target = %matched.target, error = %e, "Bad upstream URI");
            metrics::record_proxy_request(&method, 502, &matched.service, start_time);
            return error_response(StatusCode::BAD_GATEWAY, "invalid upstream address", &request_id);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        service = %matched.service,
        target = %uri,
        "Forwarding request"
    );

    let (mut parts, body) = request.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    if let Some(host) = parts.headers.remove(header::HOST) {
        parts.headers.insert(X_FORWARDED_HOST, host);
    }
    parts.uri = uri;
    parts.version = Version::HTTP_11;

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_proxy_request(&method, status.as_u16(), &matched.service, start_time);

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                service = %matched.service,
                error = %e,
                "Upstream request failed"
            );
            metrics::record_proxy_request(&method, 502, &matched.service, start_time);
            error_response(StatusCode::BAD_GATEWAY, "upstream request failed", &request_id)
        }
    }
}
