// SPDX-License-Identifier: PMPL-1.0-or-later
//! Atoms API
//!
//! HTTP API server for the atoms item store.
//! Mounts one unrestricted view and three shape-restricted views over a
//! single shared backend.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use atoms_store::{
    InMemoryTable, MetricsStore, ShapeRestricted, Store, StoreError, StoreStats, Table,
    TableStore, Value,
};

/// API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidShape { .. } => ApiError::Unprocessable(err.to_string()),
            StoreError::AbsentValue(_)
            | StoreError::InvalidName(_)
            | StoreError::ReservedKey { .. } => ApiError::BadRequest(err.to_string()),
            StoreError::BackendUnavailable(_) => ApiError::Unavailable(err.to_string()),
            StoreError::CorruptedData(_) | StoreError::Serialization(_) | StoreError::Io(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Config(msg) | ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "request failed");
        }

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ApiConfig {
    /// Read `ATOMS_HOST` and `ATOMS_PORT`, keeping defaults for unset values.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let host = lookup("ATOMS_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = match lookup("ATOMS_PORT") {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|e| ApiError::Config(format!("invalid ATOMS_PORT '{}': {}", raw, e)))?,
            _ => defaults.port,
        };
        Ok(Self { host, port })
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub backend: String,
}

/// The backend every view shares: a metered store over the configured table.
pub type Backend = MetricsStore<TableStore<Arc<dyn Table>>>;

/// A mounted view with its own counters, so view-level rejections are
/// recorded where they happen.
pub type View = MetricsStore<Arc<dyn Store>>;

/// Operation counters of the backend and of each mounted view
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub backend: StoreStats,
    pub views: BTreeMap<String, StoreStats>,
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub start_time: std::time::Instant,
    pub backend: Arc<Backend>,
    /// Views keyed by mount path segment.
    pub views: BTreeMap<&'static str, Arc<View>>,
}

impl AppState {
    pub fn new(table: Arc<dyn Table>) -> Self {
        let backend = Arc::new(MetricsStore::new(TableStore::new(table)));
        let shared: Arc<dyn Store> = backend.clone();

        let views: [(&'static str, Arc<dyn Store>); 4] = [
            ("items", shared.clone()),
            ("maps", Arc::new(ShapeRestricted::maps(shared.clone()))),
            ("lists", Arc::new(ShapeRestricted::lists(shared.clone()))),
            ("objects", Arc::new(ShapeRestricted::scalars(shared))),
        ];

        Self {
            start_time: std::time::Instant::now(),
            backend,
            views: views
                .into_iter()
                .map(|(mount, store)| (mount, Arc::new(MetricsStore::new(store))))
                .collect(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTable::new()))
    }
}

/// State of one mounted view.
#[derive(Clone)]
struct ViewState {
    store: Arc<dyn Store>,
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler));

    for (mount, view) in &state.views {
        router = router.nest(&format!("/{}", mount), view_router(view.clone()));
    }

    router.with_state(state)
}

fn view_router<S>(store: Arc<dyn Store>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/{*name}",
            get(read_handler)
                .post(add_handler)
                .put(replace_handler)
                .delete(delete_handler),
        )
        .with_state(ViewState { store })
}

/// Health check handler
#[instrument(skip(state))]
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        backend: state.backend.describe(),
    })
}

/// Operation counters of the shared backend and every view
#[instrument(skip(state))]
async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let mut views = BTreeMap::new();
    for (mount, view) in &state.views {
        views.insert(mount.to_string(), view.stats().await);
    }

    Json(StatsResponse {
        backend: state.backend.stats().await,
        views,
    })
}

/// Read one item, or search when the name is `*` or ends in `*`
#[instrument(skip(view), fields(view = %view.store.describe()))]
async fn read_handler(
    State(view): State<ViewState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if name.ends_with(atoms_store::WILDCARD) {
        let found = view.store.search(&name).await?;
        let body = found
            .into_iter()
            .map(|(name, item)| (name, item.value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        return Ok(Json(serde_json::Value::Object(body)));
    }

    match view.store.read(&name).await? {
        Some(item) => Ok(Json(item.value.to_json())),
        None => Err(ApiError::NotFound(format!("item '{}' not found", name))),
    }
}

/// Create-if-absent handler
#[instrument(skip(view, body), fields(view = %view.store.describe()))]
async fn add_handler(
    State(view): State<ViewState>,
    Path(name): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let value = Value::from_json(body);
    let created = value.to_json();

    match view.store.add(&name, value).await? {
        None => Ok((StatusCode::CREATED, Json(created))),
        Some(existing) => Ok((StatusCode::CONFLICT, Json(existing.value.to_json()))),
    }
}

/// Replace handler
#[instrument(skip(view, body), fields(view = %view.store.describe()))]
async fn replace_handler(
    State(view): State<ViewState>,
    Path(name): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match view.store.replace(&name, Value::from_json(body)).await? {
        Some(previous) => Ok(Json(previous.value.to_json())),
        None => Err(ApiError::NotFound(format!("item '{}' not found", name))),
    }
}

/// Delete handler
#[instrument(skip(view), fields(view = %view.store.describe()))]
async fn delete_handler(
    State(view): State<ViewState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match view.store.delete(&name).await? {
        Some(removed) => Ok(Json(removed.value.to_json())),
        None => Err(ApiError::NotFound(format!("item '{}' not found", name))),
    }
}

/// Start the API server
pub async fn serve(config: ApiConfig, state: AppState) -> Result<(), std::io::Error> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting atoms API server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("atoms API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
