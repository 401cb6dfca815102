//! HTTP status server.
//!
//! Serves one freshly sampled [`InsightReport`] per `GET /status`, plus the raw
//! snapshot and the top-N process ranking. Nothing is cached between requests;
//! CPU sampling runs on tokio's blocking pool.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use hostpulse_core::{
    InsightReport, MAX_TOP_N, ServiceError, StatusService, SystemSnapshot, TopProcesses,
};

/// Shared server state.
struct AppState {
    service: Arc<StatusService>,
}

#[derive(Deserialize)]
struct TopParams {
    /// Entries per ranking, clamped to `1..=MAX_TOP_N`.
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

trait JsonWithStatus<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>);
}

impl<T> JsonWithStatus<T> for Json<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>) {
        (status, self)
    }
}

fn api_error(err: ServiceError) -> ApiError {
    let status = match err {
        ServiceError::Collector(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Sampling(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!("[server] request failed: {err}");
    Json(ErrorResponse {
        success: false,
        error: err.to_string(),
    })
    .with_status(status)
}

async fn handle_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsightReport>, ApiError> {
    let report = state.service.report().await.map_err(api_error)?;
    Ok(Json(report))
}

async fn handle_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SystemSnapshot>, ApiError> {
    let snapshot = state.service.snapshot_async().await.map_err(api_error)?;
    Ok(Json(snapshot))
}

async fn handle_top(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopParams>,
) -> Result<Json<TopProcesses>, ApiError> {
    let limit = params
        .limit
        .unwrap_or_else(|| state.service.top_n_default())
        .clamp(1, MAX_TOP_N);
    let top = state
        .service
        .top_processes_async(limit)
        .await
        .map_err(api_error)?;
    Ok(Json(top))
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: hostpulse_core::VERSION.to_string(),
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let service = &state.service;
    Json(serde_json::json!({
        "name": "hostpulse",
        "version": hostpulse_core::VERSION,
        "collector": service.collector_name(),
        "policy": service.policy().as_str(),
        "prompt_style": service.style().as_str(),
        "generator": service.has_generator(),
        "endpoints": {
            "/": "This API index",
            "/status": "Verdict, readings, top process and insight",
            "/metrics": "CPU, memory and swap snapshot",
            "/processes/top": {
                "method": "GET",
                "description": "Processes ranked by memory and by CPU share",
                "params": {
                    "limit": format!("Entries per ranking (1-{MAX_TOP_N}, default: {})", service.top_n_default()),
                }
            },
            "/health": "Health check",
        },
    }))
}

/// Build the axum router.
pub fn build_router(service: Arc<StatusService>) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(handle_index))
        .route("/status", get(handle_status))
        .route("/metrics", get(handle_metrics))
        .route("/processes/top", get(handle_top))
        .route("/health", get(handle_health))
        .with_state(state)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("[server] shutdown requested"),
        Err(err) => {
            warn!("[server] cannot listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    }
}

/// Run the HTTP status server until ctrl-c.
pub async fn run_server(service: Arc<StatusService>, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(service);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("[server] listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
