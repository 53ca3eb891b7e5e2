use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use region_control::{RegionController, SystemctlManager};
use shared::{
    error::{ApiError, ControlError},
    protocol::{
        DaemonResponse, HealthResponse, RegionsResponse, StatusResponse, SwitchRequest,
        SwitchResponse,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, resolve_bind_addr};

const MAX_REQUEST_BYTES: usize = 16 * 1024;

struct AppState {
    controller: RegionController,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let addr = resolve_bind_addr(&settings.server_bind)?;
    let controller_config = settings.controller_config();
    let manager = SystemctlManager::new(&settings.systemctl_path);
    let controller = RegionController::new(&controller_config, Arc::new(manager));

    info!(
        config_dir = %controller_config.config_dir.display(),
        service = %controller_config.service_name,
        "region controller ready"
    );

    let app = build_router(Arc::new(AppState { controller }));

    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/proton/status", get(status))
        .route("/api/proton/regions", get(regions))
        .route("/api/proton/switch", post(switch_region))
        .route("/api/proton/start", post(start))
        .route("/api/proton/stop", post(stop))
        .route("/api/proton/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

fn reject(error: ControlError) -> (StatusCode, Json<ApiError>) {
    let status = if error.code().is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ApiError::from(error)))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.controller.status().await)
}

async fn regions(State(state): State<Arc<AppState>>) -> Json<RegionsResponse> {
    Json(state.controller.list_regions_with_current().await)
}

// The body is parsed leniently: a missing or malformed body is an empty
// request rather than an extractor rejection.
async fn switch_region(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<SwitchResponse> {
    let region = SwitchRequest::from_body(&body)
        .region_code()
        .unwrap_or_default();
    state
        .controller
        .switch_region(&region)
        .await
        .map(Json)
        .map_err(reject)
}

async fn start(State(state): State<Arc<AppState>>) -> ApiResult<DaemonResponse> {
    state.controller.start_daemon().await.map(Json).map_err(reject)
}

async fn stop(State(state): State<Arc<AppState>>) -> ApiResult<DaemonResponse> {
    state.controller.stop_daemon().await.map(Json).map_err(reject)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
