//! HTTP server: JSON API plus server-rendered HTML views.
//!
//! Handlers validate parameters, consult the [`SessionStore`] for the
//! active connection, and compose the [`Store`](chroma_viewer_core::store::Store)
//! with the pagination engine. They hold no other logic.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/connect` | Open a database (`{"db_path": "..."}`) |
//! | `POST` | `/api/disconnect` | Close the active database (always succeeds) |
//! | `GET`  | `/api/status` | Connection status |
//! | `GET`  | `/api/collections` | Collections with document counts |
//! | `GET`  | `/api/collection/{name}/documents` | Paginated documents (`?page=&page_size=`) |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/` | Connect form or collection list |
//! | `GET`  | `/collection/{name}` | Paginated document view |
//!
//! # Error Contract
//!
//! Every API error has the same body:
//!
//! ```json
//! { "error": { "code": "not_connected", "message": "database not connected, connect to a database first" } }
//! ```
//!
//! Error codes: `bad_request` (400), `invalid_path` (400),
//! `invalid_format` (400), `not_connected` (400), `not_found` (404),
//! `internal` (500).
//! HTML routes render the same status with an error page.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use chroma_viewer_core::models::{Collection, DocumentEntry};
use chroma_viewer_core::pagination::{paginate, Page, PageSize};
use chroma_viewer_core::ViewerError;

use crate::config::Config;
use crate::session::SessionStore;
use crate::views;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    session: Arc<SessionStore>,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(session: Arc<SessionStore>, config: Arc<Config>) -> Self {
        Self { session, config }
    }
}

/// Build the router with every route and the permissive CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/collection/{name}", get(handle_collection_view))
        .route("/api/connect", post(handle_connect))
        .route("/api/disconnect", post(handle_disconnect))
        .route("/api/status", get(handle_status))
        .route("/api/collections", get(handle_collections))
        .route("/api/collection/{name}/documents", get(handle_documents))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Bind to `[server]` host/port and serve until Ctrl-C.
pub async fn run_server(config: Arc<Config>, session: Arc<SessionStore>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Chroma viewer listening on http://{}", bind_addr);

    serve(listener, AppState::new(session, config), shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Serve on an already-bound listener until `shutdown` resolves, then close
/// the active connection.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let session = state.session.clone();
    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;

    if session.disconnect().await {
        tracing::info!("closed active database connection on shutdown");
    }
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Error type that converts into an Axum HTTP response.
///
/// [`From<ViewerError>`] is the single mapping from domain errors to HTTP
/// status codes.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }

    fn log(&self) {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, "{}", self.message);
        } else {
            tracing::debug!(code = self.code, status = %self.status, "{}", self.message);
        }
    }
}

impl From<ViewerError> for AppError {
    fn from(err: ViewerError) -> Self {
        let (status, code) = match &err {
            ViewerError::PathNotFound { .. } => (StatusCode::BAD_REQUEST, "invalid_path"),
            ViewerError::InvalidFormat { .. } => (StatusCode::BAD_REQUEST, "invalid_format"),
            ViewerError::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ViewerError::NotConnected => (StatusCode::BAD_REQUEST, "not_connected"),
            ViewerError::CollectionNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ViewerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// [`AppError`] rendered as an HTML page for the browser views.
struct PageError(AppError);

impl From<ViewerError> for PageError {
    fn from(err: ViewerError) -> Self {
        Self(err.into())
    }
}

impl From<QueryRejection> for PageError {
    fn from(rejection: QueryRejection) -> Self {
        Self(rejection.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0.log();
        let status = self.0.status;
        (status, Html(views::error_page(status, &self.0.message))).into_response()
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/connect ============

#[derive(Deserialize)]
struct ConnectRequest {
    #[serde(default)]
    db_path: Option<String>,
}

#[derive(Serialize)]
struct ConnectResponse {
    success: bool,
    message: String,
    db_path: String,
}

/// Handler for `POST /api/connect`.
///
/// Replaces any active connection. A failed connect leaves the previous
/// connection untouched.
async fn handle_connect(
    State(state): State<AppState>,
    payload: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<Json<ConnectResponse>, AppError> {
    let Json(request) = payload?;
    let db_path = request.db_path.unwrap_or_default();
    let db_path = db_path.trim();
    if db_path.is_empty() {
        return Err(ViewerError::validation("Database path is required").into());
    }

    let connection = state
        .session
        .connect(std::path::Path::new(db_path))
        .await?;

    let db_path = connection.path().display().to_string();
    Ok(Json(ConnectResponse {
        success: true,
        message: format!("Successfully connected to database at {}", db_path),
        db_path,
    }))
}

// ============ POST /api/disconnect ============

#[derive(Serialize)]
struct DisconnectResponse {
    success: bool,
    message: String,
}

/// Handler for `POST /api/disconnect`. Idempotent: the response is the
/// same whether or not a connection was open.
async fn handle_disconnect(State(state): State<AppState>) -> Json<DisconnectResponse> {
    state.session.disconnect().await;
    Json(DisconnectResponse {
        success: true,
        message: "Disconnected from database".to_string(),
    })
}

// ============ GET /api/status ============

#[derive(Serialize)]
struct StatusResponse {
    connected: bool,
    db_path: Option<String>,
    opened_at: Option<String>,
}

async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let current = state.session.current().await;
    Json(StatusResponse {
        connected: current.is_some(),
        db_path: current.as_ref().map(|c| c.path().display().to_string()),
        opened_at: current.as_ref().map(|c| c.opened_at().to_rfc3339()),
    })
}

// ============ GET /api/collections ============

async fn handle_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<Collection>>, AppError> {
    let connection = state.session.require().await?;
    let collections = connection.store().list_collections().await?;
    Ok(Json(collections))
}

// ============ GET /api/collection/{name}/documents ============

/// Query parameters for document listing.
#[derive(Debug, Deserialize, Default)]
pub struct DocumentsQuery {
    pub page: Option<i64>,
    pub page_size: Option<u32>,
}

/// One page of a collection, as served by the JSON API and the HTML view.
#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub collection_name: String,
    #[serde(flatten)]
    pub page: Page<DocumentEntry>,
}

/// Count, paginate, fetch: the composition shared by the JSON and HTML routes.
async fn load_documents(
    state: &AppState,
    name: String,
    query: DocumentsQuery,
) -> Result<DocumentsResponse, ViewerError> {
    let connection = state.session.require().await?;

    let page_size = query
        .page_size
        .unwrap_or(state.config.viewer.default_page_size);
    PageSize::try_from(page_size)?;

    let store = connection.store();
    let total = store.count_documents(&name).await?;
    let window = paginate(total, query.page.unwrap_or(1), page_size)?;
    let documents = store
        .fetch_documents(&name, window.offset, window.limit())
        .await?;

    let options = state.config.viewer.preview_options();
    let entries = documents
        .into_iter()
        .enumerate()
        .map(|(i, doc)| DocumentEntry::new(window.offset + i as u64 + 1, doc, options))
        .collect();

    Ok(DocumentsResponse {
        collection_name: name,
        page: window.into_page(entries),
    })
}

async fn handle_documents(
    State(state): State<AppState>,
    Path(name): Path<String>,
    query: Result<Query<DocumentsQuery>, QueryRejection>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let Query(query) = query?;
    Ok(Json(load_documents(&state, name, query).await?))
}

// ============ HTML views ============

async fn handle_index(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let Some(connection) = state.session.current().await else {
        return Ok(Html(views::connect_page()));
    };
    let collections = connection.store().list_collections().await?;
    Ok(Html(views::collections_page(&connection, &collections)))
}

async fn handle_collection_view(
    State(state): State<AppState>,
    Path(name): Path<String>,
    query: Result<Query<DocumentsQuery>, QueryRejection>,
) -> Result<Html<String>, PageError> {
    let Query(query) = query?;
    let response = load_documents(&state, name, query).await?;
    Ok(Html(views::documents_page(&response)))
}
