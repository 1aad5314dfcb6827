//! nodetree-api: REST API server for nodetree
//!
//! Provides HTTP endpoints to create, list and delete nodes.

mod context;
mod response;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono_tz::Tz;
use context::RequestContext;
use nodetree_core::{Config, Locale, Store, TreeEngine, context::parse_timezone};
use response::{ApiError, ApiResponse};
use serde::Deserialize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    engine: RwLock<TreeEngine<Store>>,
    default_locale: Locale,
    default_timezone: Tz,
}

impl AppState {
    fn new(engine: TreeEngine<Store>, config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            engine: RwLock::new(engine),
            default_locale: config.locale(),
            default_timezone: parse_timezone(&config.default_timezone)?,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TreeEngine<Store>>, ApiError> {
        self.engine
            .read()
            .map_err(|_| ApiError::Internal("engine lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TreeEngine<Store>>, ApiError> {
        self.engine
            .write()
            .map_err(|_| ApiError::Internal("engine lock poisoned".into()))
    }
}

/// Request to create a new node
#[derive(Debug, Default, Deserialize)]
struct CreateNodeRequest {
    #[serde(default)]
    parent: Option<i64>,
}

/// Query parameters for listing children
#[derive(Debug, Deserialize)]
struct ChildrenQuery {
    #[serde(default)]
    depth: Option<String>,
}

fn parse_path_id(raw: &str, message: &'static str) -> Result<u64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id as u64),
        _ => Err(ApiError::InvalidPathId(message)),
    }
}

fn parse_depth(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(None),
        Some(d) => d.parse::<i64>().map(Some).map_err(|_| {
            ApiError::BadRequest("depth must be an integer greater than or equal to 1".into())
        }),
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create a node, optionally under a parent
async fn create_node(
    State(state): State<Arc<AppState>>,
    RequestContext(projection): RequestContext,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    // An empty body creates a root node
    let req: CreateNodeRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateNodeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let parent = match req.parent {
        Some(p) if p <= 0 => {
            return Err(ApiError::BadRequest("The selected parent is invalid.".into()));
        }
        other => other.map(|p| p as u64),
    };

    let view = state.write()?.create_node(parent, &projection.locale)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(view))))
}

/// List root nodes
async fn list_roots(
    State(state): State<Arc<AppState>>,
    RequestContext(projection): RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let roots = state.read()?.list_roots(&projection)?;
    let count = roots.len();
    Ok(Json(ApiResponse::counted(roots, count)))
}

/// List children of a node, nested to `?depth=N` when given
async fn list_children(
    State(state): State<Arc<AppState>>,
    Path(parent_id): Path<String>,
    query: Result<Query<ChildrenQuery>, QueryRejection>,
    RequestContext(projection): RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let parent_id = parse_path_id(&parent_id, "Parent ID must be a positive integer")?;
    let Query(query) = query
        .map_err(|e| ApiError::BadRequest(format!("Invalid query string: {}", e.body_text())))?;
    let depth = parse_depth(query.depth.as_deref())?;

    let listing = state
        .read()?
        .list_children(parent_id, depth, &projection)
        .map_err(|e| match e {
            nodetree_core::Error::NotFound(_) => ApiError::NotFound("Parent node not found"),
            other => ApiError::Core(other),
        })?;

    Ok(Json(ApiResponse::ok(listing)))
}

/// Delete a node that has no children
async fn delete_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_path_id(&id, "ID must be a positive integer")?;
    let outcome = state.write()?.delete_node(id)?;

    let status =
        StatusCode::from_u16(outcome.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(ApiResponse::message(outcome.success, outcome.message))))
}

/// Build the router
fn router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/nodes", post(create_node))
        .route("/nodes/roots", get(list_roots))
        .route("/nodes/{parent_id}/children", get(list_children))
        .route("/nodes/{id}", delete(delete_node));

    Router::new()
        .route("/health", get(health))
        .nest("/v1", v1)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Open the store
    let store = Store::open().map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let config = match store.config_path() {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let engine = TreeEngine::new(store).with_max_depth(config.max_depth);
    let state = Arc::new(AppState::new(engine, &config)?);

    let app = router(state);

    // Env overrides config
    let host: std::net::IpAddr = std::env::var("NODETREE_API_HOST")
        .unwrap_or_else(|_| config.server.host.clone())
        .parse()?;
    let port: u16 = std::env::var("NODETREE_API_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(config.server.port);

    let addr = std::net::SocketAddr::new(host, port);
    tracing::info!("Starting nodetree-api on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
