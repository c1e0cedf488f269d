use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use medchat_rag::{ChatAnswer, RagPipeline};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    protocol::{ChatRequest, HealthResponse},
};

/// Name reported by the health check.
pub const SERVICE_NAME: &str = "medical-chatbot";

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    /// Whether 500 responses include the downstream error message.
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self { pipeline: Arc::new(pipeline), expose_error_details: true }
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: crate::config::DEFAULT_HOST.to_string(), port: crate::config::DEFAULT_PORT }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        medchat_telemetry::request_span(request.method().as_str(), request.uri().path())
    });

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(trace)
        .layer(cors)
}

pub async fn run_server(state: AppState, config: ServerConfig) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for medchat server")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("medchat server listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("medchat server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok".to_string(), service: SERVICE_NAME.to_string() })
}

/// The body is taken as raw bytes so that broken JSON and a missing
/// `message` produce the API's own 400 bodies.
async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatAnswer>, ApiError> {
    let body = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
        _ => ApiError::InvalidJson,
    })?;
    let request = ChatRequest::parse(&body)?;
    let answer = state
        .pipeline
        .answer(&request.message)
        .await
        .map_err(|failure| ApiError::from_pipeline(failure, state.expose_error_details))?;
    Ok(Json(answer))
}
