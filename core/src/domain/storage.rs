// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Provider Trait - Anti-Corruption Layer for the shared directory
//!
//! Isolates the admission and download logic from the filesystem so the
//! shared directory is owned by one provider value, built at startup and
//! handed to every request handler.

use async_trait::async_trait;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::domain::path_sanitizer::{PathSanitizerError, SanitizedName};

/// Byte stream over a stored file.
pub type FileReader = Pin<Box<dyn AsyncRead + Send>>;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// Metadata of a stored file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    pub file_type: FileType,
    /// Size in bytes
    pub size: u64,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error(transparent)]
    Boundary(#[from] PathSanitizerError),
}

impl StorageError {
    pub(crate) fn io(action: &str, target: impl std::fmt::Display, e: std::io::Error) -> Self {
        StorageError::Io(format!("Failed to {} {}: {}", action, target, e))
    }
}

/// Shared storage directory operations.
///
/// Every file-level method takes a [`SanitizedName`], so implementations
/// never see a client-controlled path.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Root of the shared directory.
    fn root(&self) -> &Path;

    /// Create the shared directory and its parents if missing. Idempotent.
    async fn ensure_exists(&self) -> Result<(), StorageError>;

    /// Base names of every direct entry, in enumeration order.
    async fn list_files(&self) -> Result<Vec<String>, StorageError>;

    /// Sum of the sizes of every regular file under the directory.
    async fn total_size(&self) -> Result<u64, StorageError>;

    /// Remove the directory and everything in it. An absent directory is not an error.
    async fn purge_all(&self) -> Result<(), StorageError>;

    /// Stat a stored file. Missing files yield [`StorageError::NotFound`].
    async fn stat(&self, name: &SanitizedName) -> Result<FileAttributes, StorageError>;

    /// Open a stored file for streaming.
    async fn open_read(&self, name: &SanitizedName) -> Result<FileReader, StorageError>;

    /// Start writing `name`. Nothing becomes visible under `name` until
    /// [`StagedWrite::commit`] succeeds.
    async fn begin_write(&self, name: &SanitizedName) -> Result<Box<dyn StagedWrite>, StorageError>;

    /// Verify the directory exists and is writable.
    async fn health_check(&self) -> Result<(), StorageError>;
}

/// An in-flight write into the shared directory.
#[async_trait]
pub trait StagedWrite: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError>;

    /// Flush and move the staged bytes onto the final name, replacing any
    /// existing file. Returns the number of bytes stored.
    async fn commit(self: Box<Self>) -> Result<u64, StorageError>;

    /// Discard the staged bytes.
    async fn abort(self: Box<Self>);
}
