// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP routes of the share.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::application::{AccessGate, DirectoryService, DownloadService, UploadError, UploadService};
use crate::domain::config::ShareConfigManifest;
use crate::domain::probe::ReachabilityProbe;
use crate::domain::storage::StorageProvider;

use super::error::ApiError;
use super::middleware::local_network_only;

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

pub struct AppState {
    pub gate: AccessGate,
    pub uploads: UploadService,
    pub downloads: DownloadService,
    pub directory: DirectoryService,
    pub index_file: PathBuf,
    pub trust_forwarded_for: bool,
}

impl AppState {
    /// Wire the services around one storage provider.
    pub fn from_config(
        config: &ShareConfigManifest,
        storage: Arc<dyn StorageProvider>,
        probe: Arc<dyn ReachabilityProbe>,
    ) -> anyhow::Result<Self> {
        let ranges = config.range_set()?;
        Ok(Self {
            gate: AccessGate::new(ranges, probe),
            uploads: UploadService::new(storage.clone(), config.spec.limits.clone()),
            downloads: DownloadService::new(storage.clone()),
            directory: DirectoryService::new(storage),
            index_file: config.spec.server.index_file.clone(),
            trust_forwarded_for: config.spec.network.trust_forwarded_for,
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.uploads.limits().max_request_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route("/file", post(upload_file).get(download_file).delete(purge_files))
        .route("/list", get(list_files))
        .route("/ping", get(ping))
        .route("/", get(index_page))
        .fallback(unknown_route)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(state.clone(), local_network_only)),
        )
        .with_state(state)
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    state.uploads.admit(declared).await?;

    let mut multipart = multipart.map_err(|rejection| {
        debug!(error = %rejection, "Upload request is not multipart");
        UploadError::MissingFile
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Body(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let receipt = state.uploads.store(&filename, field).await?;
        return Ok(Json(json!({
            "message": "File uploaded successfully",
            "filename": receipt.filename.as_str(),
        })));
    }

    Err(UploadError::MissingFile.into())
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    filename: Option<String>,
}

async fn download_file(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        debug!(error = %rejection, "Malformed download query");
        ApiError::Validation(rejection.body_text())
    })?;
    let download = state.downloads.open(query.filename.as_deref()).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(download.filename.as_str()));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(download.size));

    let body = Body::from_stream(ReaderStream::new(download.reader));
    Ok((StatusCode::OK, headers, body).into_response())
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8
/// name in `filename*`.
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();
    let encoded = utf8_percent_encode(filename, NON_ALPHANUMERIC);
    let value = format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", fallback, encoded);

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

async fn purge_files(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    state
        .directory
        .purge()
        .await
        .map_err(|e| ApiError::storage("Failed to remove uploads directory", e))?;
    Ok(Json(json!({ "message": "Shared file system closed" })))
}

async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let files = state
        .directory
        .list()
        .await
        .map_err(|e| ApiError::storage("Failed to list files in uploads directory", e))?;
    Ok(Json(json!({ "files": files })))
}

async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

async fn unknown_route() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn index_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    match tokio::fs::read_to_string(&state.index_file).await {
        Ok(page) => Ok(Html(page)),
        Err(e) => {
            debug!(path = %state.index_file.display(), error = %e, "Index page unavailable");
            Err(ApiError::NotFound("Index page not found".to_string()))
        }
    }
}
