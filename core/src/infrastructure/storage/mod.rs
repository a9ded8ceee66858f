// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Infrastructure Module
//!
//! Concrete implementations of the [`StorageProvider`] trait.

pub mod local;

pub use local::LocalStorageProvider;

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::storage::{StorageError, StorageProvider};

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Shared directory on the local filesystem
    Local { base_path: PathBuf },
}

/// Factory function to create storage provider from configuration
pub fn create_storage_provider(backend: StorageBackend) -> Result<Arc<dyn StorageProvider>, StorageError> {
    match backend {
        StorageBackend::Local { base_path } => Ok(Arc::new(LocalStorageProvider::new(base_path)?)),
    }
}
