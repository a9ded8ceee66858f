// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Sanitizer Domain Service
//!
//! Reduces client-supplied filenames to a bare name that can only ever refer
//! to a direct child of the shared storage directory. Uploads and downloads
//! both go through this service.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Filename normalization and traversal prevention

use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Prefix reserved for in-flight upload staging files.
pub const STAGING_PREFIX: &str = ".lanshare-upload-";

/// Path sanitization errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathSanitizerError {
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    #[error("Invalid filename: {0}")]
    InvalidPath(String),

    #[error("Path outside storage directory: {0}")]
    OutsideBoundary(String),

    #[error("Filename too long: {0}")]
    PathTooLong(String),
}

/// A filename that has been stripped of every directory component.
///
/// Only [`PathSanitizer::sanitize`] constructs these, so holding one means
/// `root.join(name)` stays a direct child of `root`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedName(String);

impl SanitizedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Wrap `name` without sanitizing it.
    #[cfg(test)]
    pub(crate) fn unchecked(name: impl Into<String>) -> Self {
        SanitizedName(name.into())
    }
}

impl fmt::Display for SanitizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for SanitizedName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// Path sanitizer domain service
///
/// # Security Guarantees
/// - Strips every directory component, treating both `/` and `\` as separators
/// - Collapses `.` and redundant separators
/// - Rejects names that reduce to nothing, `.` or `..`
/// - Rejects NUL bytes and the reserved staging prefix
#[derive(Debug, Clone)]
pub struct PathSanitizer {
    /// Maximum allowed filename length in bytes (default: 255)
    max_name_len: usize,
}

impl PathSanitizer {
    pub fn new() -> Self {
        Self { max_name_len: 255 }
    }

    /// Reduce a client-supplied filename to its base name.
    ///
    /// # Examples
    /// ```
    /// use lanshare_core::domain::path_sanitizer::PathSanitizer;
    ///
    /// let sanitizer = PathSanitizer::new();
    /// let name = sanitizer.sanitize("../../etc/passwd").unwrap();
    /// assert_eq!(name.as_str(), "passwd");
    ///
    /// assert!(sanitizer.sanitize("uploads/..").is_err());
    /// ```
    pub fn sanitize(&self, raw: &str) -> Result<SanitizedName, PathSanitizerError> {
        if raw.contains('\0') {
            tracing::warn!(filename = %raw.escape_debug(), "Filename contains null byte");
            return Err(PathSanitizerError::InvalidPath(
                "Filename contains null byte".to_string(),
            ));
        }

        let base = raw
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .last()
            .ok_or_else(|| PathSanitizerError::InvalidPath(raw.to_string()))?;

        if base == ".." {
            tracing::warn!(filename = %raw, "Filename resolves to a parent directory");
            return Err(PathSanitizerError::PathTraversal(raw.to_string()));
        }

        if base.len() > self.max_name_len {
            return Err(PathSanitizerError::PathTooLong(raw.to_string()));
        }

        if base.starts_with(STAGING_PREFIX) {
            return Err(PathSanitizerError::InvalidPath(format!(
                "{} uses a reserved prefix",
                base
            )));
        }

        if base != raw {
            tracing::debug!(original = %raw, sanitized = %base, "Stripped directory components from filename");
        }

        Ok(SanitizedName(base.to_string()))
    }

    /// Join `name` onto `root`, verifying the result is a direct child of
    /// `root`.
    pub fn join(&self, root: &Path, name: &SanitizedName) -> Result<PathBuf, PathSanitizerError> {
        let path = root.join(name);

        let mut components = path
            .strip_prefix(root)
            .map_err(|_| PathSanitizerError::OutsideBoundary(name.to_string()))?
            .components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(path),
            _ => {
                tracing::warn!(root = %root.display(), filename = %name, "Resolved path escapes storage directory");
                Err(PathSanitizerError::OutsideBoundary(name.to_string()))
            }
        }
    }
}

impl Default for PathSanitizer {
    fn default() -> Self {
        Self::new()
    }
}
