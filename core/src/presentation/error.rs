// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Mapping of every layer's errors onto HTTP status codes and the flat
//! `{"error": "..."}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::application::{DownloadError, UploadError};
use crate::domain::access::AccessError;
use crate::domain::storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    /// Caller outside the allowed ranges (403)
    AccessDenied(AccessError),
    /// Client input violates a presence or size constraint (400)
    Validation(String),
    /// Requested entry absent (404)
    NotFound(String),
    /// Route exists but not for this method (405)
    MethodNotAllowed,
    /// Underlying filesystem failure (500)
    Storage {
        context: &'static str,
        source: StorageError,
    },
}

impl ApiError {
    pub fn storage(context: &'static str, source: StorageError) -> Self {
        ApiError::Storage { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::AccessDenied(e) => e.to_string(),
            ApiError::Validation(message) | ApiError::NotFound(message) => message.clone(),
            ApiError::MethodNotAllowed => "Method not allowed".to_string(),
            ApiError::Storage { context, .. } => context.to_string(),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        ApiError::AccessDenied(e)
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Storage(source) => ApiError::storage("Failed to save file", source),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<DownloadError> for ApiError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::NotFound(_) => ApiError::NotFound("File not found".to_string()),
            DownloadError::Storage(source) => ApiError::storage("Failed to get file information", source),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage { context, source } = &self {
            error!(error = %source, "{}", context);
        }

        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
