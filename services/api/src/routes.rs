use crate::infra::{AppState, UploadError};
use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use claim_scan::workflows::scan::{scan_router, ObjectStore, ScanRepository, ScanService};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadQuery {
    #[serde(default)]
    pub(crate) token: String,
}

pub(crate) fn with_scan_routes<R, S>(service: Arc<ScanService<R, S>>) -> axum::Router
where
    R: ScanRepository + 'static,
    S: ObjectStore + 'static,
{
    scan_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/uploads/*path", axum::routing::put(upload_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Receives the bytes for a slot issued by `/api/upload-urls`.
pub(crate) async fn upload_endpoint(
    Extension(state): Extension<AppState>,
    Path(path): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> impl IntoResponse {
    let store = state.store.clone();
    let target = path.clone();
    let write = tokio::task::spawn_blocking(move || {
        store.accept_upload(&target, &query.token, &body)
    });
    let outcome = match write.await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(%path, error = %err, "upload task failed");
            let payload = json!({ "error": "upload failed" });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload));
        }
    };

    match outcome {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "path": path }))),
        Err(err) => {
            let status = match err {
                UploadError::InvalidPath => StatusCode::BAD_REQUEST,
                UploadError::InvalidToken => StatusCode::FORBIDDEN,
                UploadError::Io(_) => {
                    warn!(%path, error = %err, "upload write failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, Json(json!({ "error": err.to_string() })))
        }
    }
}
