// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Upload size ceilings and the admission rules built on them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GIB: u64 = 1 << 30;
pub const MIB: u64 = 1 << 20;

/// Default per-file ceiling (5 GiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * GIB;
/// Default aggregate ceiling for the whole shared directory (10 GiB).
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 10 * GIB;
/// Headroom allowed on top of the per-file ceiling for multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: u64 = MIB;

/// A ceiling that an upload would break.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("Request size {declared} exceeds the limit of {limit} bytes")]
    RequestTooLarge { declared: u64, limit: u64 },

    #[error("File size exceeds the limit of {limit} bytes")]
    FileTooLarge { limit: u64 },

    #[error("Total size of shared directory would exceed the limit of {limit} bytes (currently {current} bytes used)")]
    QuotaExceeded { current: u64, limit: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
    /// Largest single stored file
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Largest combined size of the shared directory
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,

    /// Largest request body accepted for parsing
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: u64,
}

impl UploadLimits {
    /// Reject a request whose declared body length is over the parsing ceiling.
    pub fn check_request(&self, declared: Option<u64>) -> Result<(), LimitViolation> {
        match declared {
            Some(declared) if declared > self.max_request_bytes => Err(LimitViolation::RequestTooLarge {
                declared,
                limit: self.max_request_bytes,
            }),
            _ => Ok(()),
        }
    }

    /// Check a file of `incoming` bytes against both ceilings, given
    /// `current` bytes already stored.
    ///
    /// Accepted iff `incoming <= max_file_bytes` and
    /// `current + incoming <= max_total_bytes`.
    pub fn check_file(&self, current: u64, incoming: u64) -> Result<(), LimitViolation> {
        if incoming > self.max_file_bytes {
            return Err(LimitViolation::FileTooLarge {
                limit: self.max_file_bytes,
            });
        }

        match current.checked_add(incoming) {
            Some(total) if total <= self.max_total_bytes => Ok(()),
            _ => Err(LimitViolation::QuotaExceeded {
                current,
                limit: self.max_total_bytes,
            }),
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_total_bytes: default_max_total_bytes(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_max_total_bytes() -> u64 {
    DEFAULT_MAX_TOTAL_BYTES
}

fn default_max_request_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES + MULTIPART_OVERHEAD_BYTES
}
