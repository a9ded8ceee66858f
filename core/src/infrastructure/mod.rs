// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod network;
pub mod probe;
pub mod storage;

pub use probe::PingProbe;
pub use storage::LocalStorageProvider;
