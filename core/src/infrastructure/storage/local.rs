// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem Storage Provider
//!
//! Filesystem-backed implementation of [`StorageProvider`] for the shared
//! directory.
//!
//! **Limitations:**
//! - No locking: concurrent uploads of the same name race, last rename wins
//! - A purge can remove a file while it is being downloaded
//! - Aggregate size is re-walked on every call, O(files)

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::path_sanitizer::{PathSanitizer, SanitizedName, STAGING_PREFIX};
use crate::domain::storage::{FileAttributes, FileReader, FileType, StagedWrite, StorageError, StorageProvider};

/// Local filesystem storage provider
///
/// Owns the absolute path of the shared directory. The directory itself is
/// created lazily by [`StorageProvider::ensure_exists`].
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    base_path: PathBuf,
    sanitizer: PathSanitizer,
}

impl LocalStorageProvider {
    /// Create new local storage provider
    ///
    /// Relative paths are resolved against the current working directory
    /// once, here, so later changes to the working directory have no effect.
    ///
    /// # Example
    /// ```rust
    /// use lanshare_core::infrastructure::storage::LocalStorageProvider;
    ///
    /// let provider = LocalStorageProvider::new("/srv/lanshare/uploads").unwrap();
    /// ```
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        let base_path = std::path::absolute(&base_path)
            .map_err(|e| StorageError::io("resolve", base_path.display(), e))?;
        Ok(Self {
            base_path,
            sanitizer: PathSanitizer::new(),
        })
    }

    /// Absolute path of `name`, checked to be a direct child of the root.
    fn resolve_path(&self, name: &SanitizedName) -> Result<PathBuf, StorageError> {
        Ok(self.sanitizer.join(&self.base_path, name)?)
    }

    /// Sum regular-file sizes under `path`. A missing root counts as empty;
    /// any other walk error aborts the whole sum.
    fn calculate_size(path: &Path) -> Result<u64, std::io::Error> {
        if !path.exists() {
            return Ok(0);
        }

        let mut total = 0u64;
        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry?;
            if entry.file_type().is_file() {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    }

    fn is_staging_name(name: &str) -> bool {
        name.starts_with(STAGING_PREFIX)
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn root(&self) -> &Path {
        &self.base_path
    }

    async fn ensure_exists(&self) -> Result<(), StorageError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o755);

        builder
            .create(&self.base_path)
            .await
            .map_err(|e| StorageError::io("create directory", self.base_path.display(), e))
    }

    async fn list_files(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io("list directory", self.base_path.display(), e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io("read entry in", self.base_path.display(), e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !Self::is_staging_name(&name) {
                files.push(name);
            }
        }

        Ok(files)
    }

    async fn total_size(&self) -> Result<u64, StorageError> {
        let path = self.base_path.clone();
        tokio::task::spawn_blocking(move || Self::calculate_size(&path))
            .await
            .map_err(|e| StorageError::Io(format!("Size walk task failed: {}", e)))?
            .map_err(|e| StorageError::io("calculate size of", self.base_path.display(), e))
    }

    async fn purge_all(&self) -> Result<(), StorageError> {
        match fs::remove_dir_all(&self.base_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io("remove directory", self.base_path.display(), e)),
        }
    }

    async fn stat(&self, name: &SanitizedName) -> Result<FileAttributes, StorageError> {
        let path = self.resolve_path(name)?;
        let metadata = match fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => return Err(StorageError::io("stat", path.display(), e)),
        };

        let file_type = if metadata.is_dir() {
            FileType::Directory
        } else if metadata.file_type().is_symlink() {
            FileType::Symlink
        } else {
            FileType::File
        };

        Ok(FileAttributes {
            file_type,
            size: metadata.len(),
        })
    }

    async fn open_read(&self, name: &SanitizedName) -> Result<FileReader, StorageError> {
        let path = self.resolve_path(name)?;
        match File::open(&path).await {
            Ok(file) => {
                let reader: FileReader = Box::pin(file);
                Ok(reader)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_string())),
            Err(e) => Err(StorageError::io("open", path.display(), e)),
        }
    }

    async fn begin_write(&self, name: &SanitizedName) -> Result<Box<dyn StagedWrite>, StorageError> {
        let target = self.resolve_path(name)?;
        let staging = self
            .base_path
            .join(format!("{}{}.part", STAGING_PREFIX, uuid::Uuid::new_v4()));

        let file = File::create(&staging)
            .await
            .map_err(|e| StorageError::io("create", staging.display(), e))?;

        debug!(staging = %staging.display(), target = %target.display(), "Staged upload opened");

        let staged: Box<dyn StagedWrite> = Box::new(LocalStagedWrite {
            writer: Some(BufWriter::new(file)),
            staging,
            target,
            written: 0,
        });
        Ok(staged)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        if !self.base_path.is_dir() {
            return Err(StorageError::Io(format!(
                "Base directory {} does not exist",
                self.base_path.display()
            )));
        }

        let test_file = self.base_path.join(format!("{}health-check", STAGING_PREFIX));
        fs::write(&test_file, b"health-check")
            .await
            .map_err(|e| StorageError::Io(format!("Health check failed (not writable): {}", e)))?;

        fs::remove_file(&test_file)
            .await
            .map_err(|e| StorageError::Io(format!("Health check cleanup failed: {}", e)))?;

        Ok(())
    }
}

/// Upload written to a hidden staging file and renamed into place on commit.
struct LocalStagedWrite {
    writer: Option<BufWriter<File>>,
    staging: PathBuf,
    target: PathBuf,
    written: u64,
}

#[async_trait]
impl StagedWrite for LocalStagedWrite {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| StorageError::Io("Staged upload already closed".to_string()))?;
        writer
            .write_all(chunk)
            .await
            .map_err(|e| StorageError::io("write", self.staging.display(), e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<u64, StorageError> {
        let Some(mut writer) = self.writer.take() else {
            return Err(StorageError::Io("Staged upload already closed".to_string()));
        };

        writer
            .flush()
            .await
            .map_err(|e| StorageError::io("flush", self.staging.display(), e))?;
        writer
            .into_inner()
            .sync_all()
            .await
            .map_err(|e| StorageError::io("sync", self.staging.display(), e))?;

        fs::rename(&self.staging, &self.target)
            .await
            .map_err(|e| StorageError::io("save", self.target.display(), e))?;

        // Renamed away; nothing left for Drop to clean up.
        self.staging = PathBuf::new();
        Ok(self.written)
    }

    async fn abort(mut self: Box<Self>) {
        self.writer.take();
        if let Err(e) = fs::remove_file(&self.staging).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(staging = %self.staging.display(), error = %e, "Failed to remove staged upload");
            }
        }
        self.staging = PathBuf::new();
    }
}

impl Drop for LocalStagedWrite {
    fn drop(&mut self) {
        if self.staging.as_os_str().is_empty() {
            return;
        }
        self.writer.take();

        let staging = std::mem::take(&mut self.staging);
        let remove = move || {
            if let Err(e) = std::fs::remove_file(&staging) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(staging = %staging.display(), error = %e, "Failed to remove abandoned staged upload");
                }
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(remove);
            }
            Err(_) => remove(),
        }
    }
}
