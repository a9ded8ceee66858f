// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Access Gate Application Service
//!
//! Decides, for every inbound request, whether the caller is on the local
//! network. Runs before any storage logic.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::access::{parse_client_ip, AccessError, PrivateRangeSet};
use crate::domain::probe::{NoopProbe, ReachabilityProbe};

pub struct AccessGate {
    ranges: PrivateRangeSet,
    probe: Arc<dyn ReachabilityProbe>,
}

impl AccessGate {
    pub fn new(ranges: PrivateRangeSet, probe: Arc<dyn ReachabilityProbe>) -> Self {
        Self { ranges, probe }
    }

    /// Gate over `ranges` with probing disabled.
    pub fn without_probe(ranges: PrivateRangeSet) -> Self {
        Self::new(ranges, Arc::new(NoopProbe))
    }

    pub fn ranges(&self) -> &PrivateRangeSet {
        &self.ranges
    }

    /// Fire the reachability probe, then classify `raw_ip`.
    ///
    /// The probe never affects the result.
    pub fn check(&self, raw_ip: &str) -> Result<IpAddr, AccessError> {
        if let Some(ip) = parse_client_ip(raw_ip) {
            self.probe.probe(ip);
        }

        match self.ranges.classify(raw_ip) {
            Ok(ip) => {
                debug!(client_ip = %ip, "Access granted");
                Ok(ip)
            }
            Err(e) => {
                warn!(client_ip = %raw_ip, error = ?e, "Access denied");
                Err(e)
            }
        }
    }
}
