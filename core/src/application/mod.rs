// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod access_gate;
pub mod directory;
pub mod download;
pub mod upload;

pub use access_gate::AccessGate;
pub use directory::DirectoryService;
pub use download::{Download, DownloadError, DownloadService};
pub use upload::{UploadError, UploadReceipt, UploadService};
