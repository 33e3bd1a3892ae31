use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use guidebase::config::ExtractionConfig;
use guidebase::error::ExtractionError;
use guidebase::extraction::{ExtractionClient, JobHandle, JobStart};
use guidebase::poll::JobState;
use guidebase::schema::ContentKind;
use guidebase::store::Store;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// SQLite database path.
    #[arg(long, default_value = "data/guidebase.sqlite3")]
    db: PathBuf,
}

#[derive(Clone)]
struct AppState {
    store: Arc<Store>,
    extraction: Option<Arc<ExtractionClient>>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    guidebase::logging::init()?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting guidebase-app");

    let store = Arc::new(Store::open(&args.db)?);

    let extraction = match ExtractionConfig::from_env() {
        Ok(config) => Some(Arc::new(ExtractionClient::new(config)?)),
        Err(err) => {
            tracing::warn!(%err, "extraction service not configured; extraction routes disabled");
            None
        }
    };

    let state = AppState { store, extraction };

    let app = Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/extract", post(start_extraction))
        .route("/api/poll/:job_id", get(poll_job))
        .route("/api/items", get(list_items).post(import_job))
        .route("/api/items/:id", get(get_item).delete(delete_item))
        .route("/api/items/:id/checklist", post(copy_to_checklist))
        .route("/api/checklist", get(get_checklist).delete(clear_checklist))
        .route("/api/checklist/:id", delete(remove_checklist_item))
        .route("/api/checklist/:id/toggle", post(toggle_checklist_item))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ExtractRequest {
    url: Option<String>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobQuery {
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImportRequest {
    job_id: Option<String>,
    kind: Option<String>,
}

async fn start_extraction(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Response {
    let Some(client) = state.extraction.as_deref() else {
        return config_error_response();
    };
    let Some(url) = req.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "URL is required");
    };
    let kind = match parse_kind(req.kind.as_deref()) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match client.start_job(url, kind).await {
        Ok(JobStart::Accepted(handle)) => Json(json!({
            "success": true,
            "job_id": handle.job_id,
            "kind": handle.kind,
        }))
        .into_response(),
        // Fast pages come back finished; store the result without a poll cycle.
        Ok(JobStart::Completed(mut item)) => {
            if item.source_url.is_none() {
                item.source_url = Some(url.to_string());
            }
            match state.store.save(&item) {
                Ok(item_id) => Json(json!({ "success": true, "item_id": item_id })).into_response(),
                Err(err) => storage_error_response(err),
            }
        }
        Err(err) => extraction_error_response(&err),
    }
}

async fn poll_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<JobQuery>,
) -> Response {
    let Some(client) = state.extraction.as_deref() else {
        return config_error_response();
    };
    let kind = match parse_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let handle = match job_handle(&job_id, kind) {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match client.poll_once(&handle).await {
        Ok(snapshot) => Json(json!({
            "success": true,
            "status": snapshot.state,
            "progress": snapshot.progress,
            "data": snapshot.data,
            "error": snapshot.error,
        }))
        .into_response(),
        Err(err) => extraction_error_response(&err),
    }
}

/// Imports the finished result of a job into storage.
async fn import_job(State(state): State<AppState>, Json(req): Json<ImportRequest>) -> Response {
    let Some(client) = state.extraction.as_deref() else {
        return config_error_response();
    };
    let Some(job_id) = req.job_id.as_deref() else {
        return error_response(StatusCode::BAD_REQUEST, "job_id is required");
    };
    let kind = match parse_kind(req.kind.as_deref()) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let handle = match job_handle(job_id, kind) {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    let snapshot = match client.poll_once(&handle).await {
        Ok(snapshot) => snapshot,
        Err(err) => return extraction_error_response(&err),
    };

    match snapshot.state {
        JobState::Completed => {
            let Some(item) = snapshot.data else {
                return error_response(
                    StatusCode::BAD_GATEWAY,
                    "completed job carries no extraction data",
                );
            };
            match state.store.save(&item) {
                Ok(item_id) => Json(json!({ "success": true, "item_id": item_id })).into_response(),
                Err(err) => storage_error_response(err),
            }
        }
        JobState::Failed => error_response(
            StatusCode::BAD_GATEWAY,
            snapshot
                .error
                .unwrap_or_else(|| guidebase::poll::DEFAULT_FAILURE_MESSAGE.to_string()),
        ),
        JobState::Pending | JobState::Running => {
            error_response(StatusCode::CONFLICT, "job has not finished yet")
        }
    }
}

async fn list_items(State(state): State<AppState>) -> Response {
    match state.store.list() {
        Ok(items) => Json(json!({ "success": true, "items": items })).into_response(),
        Err(err) => storage_error_response(err),
    }
}

async fn get_item(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.load(&id) {
        Ok(Some(item)) => Json(json!({ "success": true, "item": item })).into_response(),
        Ok(None) => not_found_response(),
        Err(err) => storage_error_response(err),
    }
}

async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.delete(&id) {
        Ok(true) => Json(json!({ "success": true })).into_response(),
        Ok(false) => not_found_response(),
        Err(err) => storage_error_response(err),
    }
}

async fn copy_to_checklist(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.add_item_to_checklist(&id) {
        Ok(Some(copied)) => Json(json!({ "success": true, "copied": copied })).into_response(),
        Ok(None) => not_found_response(),
        Err(err) => storage_error_response(err),
    }
}

async fn get_checklist(State(state): State<AppState>) -> Response {
    match state.store.checklist() {
        Ok(entries) => Json(json!({ "success": true, "checklist": entries })).into_response(),
        Err(err) => storage_error_response(err),
    }
}

async fn toggle_checklist_item(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.toggle_checklist_item(&id) {
        Ok(true) => Json(json!({ "success": true })).into_response(),
        Ok(false) => not_found_response(),
        Err(err) => storage_error_response(err),
    }
}

async fn remove_checklist_item(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.remove_checklist_item(&id) {
        Ok(true) => Json(json!({ "success": true })).into_response(),
        Ok(false) => not_found_response(),
        Err(err) => storage_error_response(err),
    }
}

async fn clear_checklist(State(state): State<AppState>) -> Response {
    match state.store.clear_checklist() {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(err) => storage_error_response(err),
    }
}

fn parse_kind(raw: Option<&str>) -> Result<ContentKind, Response> {
    match raw {
        None => Ok(ContentKind::Tutorial),
        Some(raw) => ContentKind::parse(raw).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("unsupported kind {raw:?}: expected tutorial or recipe"),
            )
        }),
    }
}

fn job_handle(job_id: &str, kind: ContentKind) -> Result<JobHandle, Response> {
    let job_id = job_id.trim();
    if job_id.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "job id is required",
        ));
    }
    Ok(JobHandle {
        job_id: job_id.to_string(),
        kind,
    })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message.into() })),
    )
        .into_response()
}

/// Configuration problems are logged server-side and answered with a generic
/// message; credential values never reach the caller.
fn config_error_response() -> Response {
    tracing::error!("extraction requested but the service credentials are not configured");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "server configuration error",
    )
}

fn extraction_error_response(err: &ExtractionError) -> Response {
    let status = match err {
        ExtractionError::Validation(_) => StatusCode::BAD_REQUEST,
        ExtractionError::Config(_) => {
            tracing::error!(%err, "extraction configuration error");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server configuration error",
            );
        }
        ExtractionError::Auth | ExtractionError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        ExtractionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ExtractionError::NotFound => StatusCode::NOT_FOUND,
    };
    error_response(status, err.to_string())
}

fn storage_error_response(err: anyhow::Error) -> Response {
    tracing::error!(?err, "storage operation failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage error")
}

fn not_found_response() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}
