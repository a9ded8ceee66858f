// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Reachability probe fired by the access gate.
//!
//! The gate pokes every caller before classifying it. A probe returns
//! immediately and never influences the access decision.

use std::net::IpAddr;

pub trait ReachabilityProbe: Send + Sync {
    /// Start a probe toward `ip`. Must not block and must swallow every failure.
    fn probe(&self, ip: IpAddr);
}

/// Probe that does nothing. Used when probing is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProbe;

impl ReachabilityProbe for NoopProbe {
    fn probe(&self, _ip: IpAddr) {}
}
