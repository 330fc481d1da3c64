use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::domain::ScanId;
use super::intake::UploadRequest;
use super::repository::{RepositoryError, ScanRepository};
use super::service::{AccessError, ScanService, ScanServiceError};
use super::storage::ObjectStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadUrlsRequest {
    #[serde(default)]
    pub(crate) scan_id: String,
    #[serde(default)]
    pub(crate) files: Vec<UploadRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompleteRequest {
    #[serde(default)]
    pub(crate) contact: Option<Value>,
    #[serde(default)]
    pub(crate) utm: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenQuery {
    #[serde(default)]
    pub(crate) token: String,
}

/// Router builder exposing the scan endpoints.
pub fn scan_router<R, S>(service: Arc<ScanService<R, S>>) -> Router
where
    R: ScanRepository + 'static,
    S: ObjectStore + 'static,
{
    Router::new()
        .route("/api/scans/new", post(create_handler::<R, S>))
        .route("/api/upload-urls", post(upload_urls_handler::<R, S>))
        .route("/api/scans/:scan_id", get(result_handler::<R, S>))
        .route(
            "/api/scans/:scan_id/complete",
            post(complete_handler::<R, S>),
        )
        .route("/api/scans/:scan_id/summary", get(summary_handler::<R, S>))
        .with_state(service)
}

pub(crate) async fn create_handler<R, S>(State(service): State<Arc<ScanService<R, S>>>) -> Response
where
    R: ScanRepository + 'static,
    S: ObjectStore + 'static,
{
    match service.create_scan(Utc::now()) {
        Ok(ticket) => (StatusCode::OK, axum::Json(ticket)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn upload_urls_handler<R, S>(
    State(service): State<Arc<ScanService<R, S>>>,
    axum::Json(request): axum::Json<UploadUrlsRequest>,
) -> Response
where
    R: ScanRepository + 'static,
    S: ObjectStore + 'static,
{
    let scan_id = ScanId(request.scan_id);
    match service.sign_uploads(&scan_id, &request.files) {
        Ok(slots) => (StatusCode::OK, axum::Json(slots)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn complete_handler<R, S>(
    State(service): State<Arc<ScanService<R, S>>>,
    Path(scan_id): Path<String>,
    axum::Json(request): axum::Json<CompleteRequest>,
) -> Response
where
    R: ScanRepository + 'static,
    S: ObjectStore + 'static,
{
    let scan_id = ScanId(scan_id);
    // Listing, fetching and PDF parsing all block.
    let task = tokio::task::spawn_blocking(move || {
        service.complete(&scan_id, request.contact, request.utm)
    });
    match task.await {
        Ok(Ok(view)) => (StatusCode::OK, axum::Json(view)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(err) => {
            warn!(error = %err, "scan completion task failed");
            let payload = json!({ "error": "scan completion failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn result_handler<R, S>(
    State(service): State<Arc<ScanService<R, S>>>,
    Path(scan_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Response
where
    R: ScanRepository + 'static,
    S: ObjectStore + 'static,
{
    match service.result(&ScanId(scan_id), &query.token, Utc::now()) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn summary_handler<R, S>(
    State(service): State<Arc<ScanService<R, S>>>,
    Path(scan_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Response
where
    R: ScanRepository + 'static,
    S: ObjectStore + 'static,
{
    match service.summary(&ScanId(scan_id), &query.token, Utc::now()) {
        Ok(report) => {
            let disposition = format!("attachment; filename=\"{}\"", report.file_name());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                report.render(),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: ScanServiceError) -> Response {
    let status = match &err {
        ScanServiceError::InvalidRequest(_) | ScanServiceError::Evaluation(_) => {
            StatusCode::BAD_REQUEST
        }
        ScanServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ScanServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ScanServiceError::Access(AccessError::Unauthorized) => StatusCode::UNAUTHORIZED,
        ScanServiceError::Access(AccessError::Expired) => StatusCode::GONE,
        ScanServiceError::Storage(_)
        | ScanServiceError::Repository(_)
        | ScanServiceError::TokenLifetime => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        warn!(error = %err, "scan request failed");
    }

    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
