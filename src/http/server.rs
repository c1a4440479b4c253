//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the faucet handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Derive the client origin used for rate limiting
//! - Bind server to listener and stop on shutdown

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::faucet::Faucet;
use crate::http::request::{request_id, ClaimRequest, MakeRequestUuid, MAX_BODY_BYTES};
use crate::http::response::{bad_request, ClaimResponse};
use crate::security::client_origin;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub faucet: Arc<Faucet>,
    pub proxy_count: usize,
}

/// HTTP server for the faucet API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// `request_timeout` bounds whole requests; claims carry their own deadline too.
    pub fn new(faucet: Arc<Faucet>, proxy_count: usize, request_timeout: Duration) -> Self {
        let state = AppState { faucet, proxy_count };
        Self { router: Self::build_router(state, request_timeout) }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        // Outlives the claim deadline so a slow transfer reports its own error.
        let http_timeout = request_timeout + Duration::from_secs(1);

        Router::new()
            .route("/api/claim", post(claim_handler))
            .route("/api/info", get(info_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "http",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(http_timeout)),
            )
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn claim_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Json<ClaimRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.status(), rejection.body_text()),
    };

    let origin = client_origin(&headers, peer, state.proxy_count);
    match state.faucet.claim(&request.address, &origin).await {
        Ok(dispatch) => Json(ClaimResponse::from_dispatch(request.address.trim(), dispatch)).into_response(),
        Err(e) => {
            tracing::debug!(client = %origin, error = %e, "Claim rejected");
            e.into_response()
        }
    }
}

async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.faucet.info())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dispatcher = state.faucet.dispatcher();
    Json(json!({
        "status": "ok",
        "queued": dispatcher.queue_len(),
        "busy": dispatcher.gate().is_held(),
    }))
}
