// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Download Application Service
//!
//! Resolves a requested filename inside the shared directory. The name goes
//! through the same sanitizer as uploads.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::path_sanitizer::{PathSanitizer, PathSanitizerError, SanitizedName};
use crate::domain::storage::{FileReader, FileType, StorageError, StorageProvider};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("No filename specified")]
    MissingFilename,

    #[error("Invalid filename: {0}")]
    InvalidFilename(#[from] PathSanitizerError),

    #[error("File not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for DownloadError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(name) => DownloadError::NotFound(name),
            other => DownloadError::Storage(other),
        }
    }
}

/// A stored file ready to be streamed.
pub struct Download {
    pub filename: SanitizedName,
    pub size: u64,
    pub reader: FileReader,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("filename", &self.filename)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

pub struct DownloadService {
    storage: Arc<dyn StorageProvider>,
    sanitizer: PathSanitizer,
}

impl DownloadService {
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        Self {
            storage,
            sanitizer: PathSanitizer::new(),
        }
    }

    pub async fn open(&self, requested: Option<&str>) -> Result<Download, DownloadError> {
        self.storage.ensure_exists().await?;

        let requested = requested
            .filter(|name| !name.is_empty())
            .ok_or(DownloadError::MissingFilename)?;
        let filename = self.sanitizer.sanitize(requested)?;

        let attrs = self.storage.stat(&filename).await?;
        if attrs.file_type != FileType::File {
            debug!(%filename, file_type = ?attrs.file_type, "Requested entry is not a regular file");
            return Err(DownloadError::NotFound(filename.into_string()));
        }

        let reader = self.storage.open_read(&filename).await?;
        info!(%filename, size = attrs.size, "Serving download");

        Ok(Download {
            filename,
            size: attrs.size,
            reader,
        })
    }
}
