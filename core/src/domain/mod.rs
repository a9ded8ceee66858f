// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: storage contract, upload ceilings, filename sanitization,
//! local network classification and configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Business rules with no transport or filesystem dependency

pub mod access;
pub mod config;
pub mod path_sanitizer;
pub mod probe;
pub mod storage;
pub mod upload;
