/// HTTP server for the model catalog
///
/// Routes:
/// - `GET /files` - `{ "basePath": string | null, "files": [string] }`
/// - `GET /files/<id>` - raw model bytes, 404 for ids not in the catalog
/// - `GET /heartbeat` - `ok`, restarts the idle timer; 404 for cross-origin
///   callers so foreign pages cannot keep the process alive
///
/// - `cors.rs` - origin policy for the file route
/// - `idle.rs` - idle shutdown timer

pub mod cors;
pub mod idle;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::catalog::local::LocalCatalog;
use crate::catalog::{CatalogSnapshot, FileCatalog};
use crate::error::{FetchError, ServerError};
use cors::CorsPolicy;
use idle::IdleTimer;

const GLB_CONTENT_TYPE: &str = "model/gltf-binary";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<LocalCatalog>,
    pub cors: Arc<CorsPolicy>,
    pub idle: IdleTimer,
}

/// Handler errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotInCatalog(id) => ApiError::NotFound(id),
            FetchError::Io { id, reason } => {
                warn!("⚠️  Could not read {}: {}", id, reason);
                ApiError::NotFound(id)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(id) => {
                debug!("🔍 Not found: {}", id);
                StatusCode::NOT_FOUND.into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let file_route = match state.cors.layer() {
        Some(cors) => get(get_file).layer(cors),
        None => get(get_file),
    };

    Router::new()
        .route("/files", get(list_files))
        .route("/files/*id", file_route)
        .route("/heartbeat", get(heartbeat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_files(State(state): State<AppState>) -> Result<Json<CatalogSnapshot>, ApiError> {
    Ok(Json(state.catalog.snapshot().await?))
}

async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let bytes = state.catalog.read(&id).await?;

    if let Some(origin) = headers.get(header::ORIGIN).and_then(|o| o.to_str().ok()) {
        if state.cors.allows(origin) {
            info!("🌐 Allowing request to /files/{} from {}", id, origin);
        }
    }

    Ok(([(header::CONTENT_TYPE, GLB_CONTENT_TYPE)], Body::from(bytes)).into_response())
}

async fn heartbeat(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if headers.contains_key(header::ORIGIN) {
        return StatusCode::NOT_FOUND.into_response();
    }
    state.idle.touch();
    "ok".into_response()
}

/// Bind on localhost; `None` lets the OS pick a free port
pub async fn bind(port: Option<u16>) -> Result<TcpListener, ServerError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port.unwrap_or(0)));
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            port: port.unwrap_or(0),
            source,
        })
}

/// Serve until the idle timer runs out
pub async fn run(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    info!(
        "🚀 Serving {} models on http://{}",
        state.catalog.files().len(),
        addr
    );

    if !state.idle.is_enabled() {
        info!("⏱️  Idle timeout disabled");
    }
    state.idle.touch();
    let shutdown = state.idle.clone().expired();

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("👋 Server stopped");
    Ok(())
}
