// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Upload Admission Application Service
//!
//! Decides whether an incoming file may be stored and persists it if so.
//!
//! ```text
//! admit(declared_len)          ensure directory, request ceiling
//!   └─ store(name, stream)     sanitize, sample aggregate size,
//!                              stream into staging under both ceilings,
//!                              commit (rename) or abort
//! ```
//!
//! A rejected or failed upload leaves the shared directory as it was.

use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::path_sanitizer::{PathSanitizer, PathSanitizerError, SanitizedName};
use crate::domain::storage::{StagedWrite, StorageError, StorageProvider};
use crate::domain::upload::{LimitViolation, UploadLimits};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Limit(#[from] LimitViolation),

    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid filename: {0}")]
    InvalidFilename(#[from] PathSanitizerError),

    #[error("Malformed upload body: {0}")]
    Body(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    /// True for rejections caused by the client's request, false for server faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Storage(_))
    }
}

/// Outcome of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub filename: SanitizedName,
    pub size: u64,
}

pub struct UploadService {
    storage: Arc<dyn StorageProvider>,
    limits: UploadLimits,
    sanitizer: PathSanitizer,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageProvider>, limits: UploadLimits) -> Self {
        Self {
            storage,
            limits,
            sanitizer: PathSanitizer::new(),
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Request-level checks run before the body is parsed.
    pub async fn admit(&self, declared_len: Option<u64>) -> Result<(), UploadError> {
        self.storage.ensure_exists().await?;
        self.limits.check_request(declared_len).map_err(|violation| {
            warn!(declared_len = ?declared_len, "Upload request rejected: {}", violation);
            UploadError::from(violation)
        })
    }

    /// Stream one file into the shared directory under `raw_name`.
    pub async fn store<S, E>(&self, raw_name: &str, body: S) -> Result<UploadReceipt, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let filename = self.sanitizer.sanitize(raw_name).map_err(|e| {
            warn!(filename = %raw_name, "Upload rejected: {}", e);
            UploadError::from(e)
        })?;

        let current = self.storage.total_size().await?;
        self.limits.check_file(current, 0)?;

        let mut staged = self.storage.begin_write(&filename).await?;
        if let Err(e) = self.pump(&mut *staged, current, body).await {
            staged.abort().await;
            if e.is_client_error() {
                warn!(%filename, current_total = current, "Upload rejected: {}", e);
            }
            return Err(e);
        }

        let size = staged.commit().await?;
        info!(%filename, size, total = current + size, "File uploaded");

        Ok(UploadReceipt { filename, size })
    }

    async fn pump<S, E>(&self, staged: &mut dyn StagedWrite, current: u64, body: S) -> Result<u64, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let mut body = std::pin::pin!(body);
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| UploadError::Body(e.to_string()))?;
            written += chunk.len() as u64;
            self.limits.check_file(current, written)?;
            staged.write_chunk(&chunk).await?;
        }
        Ok(written)
    }
}
