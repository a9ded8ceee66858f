// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Listing and purging of the shared directory.

use std::sync::Arc;

use tracing::info;

use crate::domain::storage::{StorageError, StorageProvider};

pub struct DirectoryService {
    storage: Arc<dyn StorageProvider>,
}

impl DirectoryService {
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        Self { storage }
    }

    /// Names of the stored files, in filesystem order.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        self.storage.ensure_exists().await?;
        self.storage.list_files().await
    }

    /// Delete the shared directory and everything in it.
    pub async fn purge(&self) -> Result<(), StorageError> {
        self.storage.ensure_exists().await?;
        self.storage.purge_all().await?;
        info!(directory = %self.storage.root().display(), "Shared directory purged");
        Ok(())
    }
}
