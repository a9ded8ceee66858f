// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ICMP reachability probe backed by the system `ping` binary.

use std::net::IpAddr;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::domain::probe::{NoopProbe, ReachabilityProbe};

/// Sends a single echo request via `ping` without waiting for the reply.
///
/// The child process is detached as soon as it is spawned; tokio reaps it in
/// the background. Spawn failures (no `ping` binary, no runtime) are logged at
/// debug level and dropped.
#[derive(Debug, Clone)]
pub struct PingProbe {
    program: String,
}

impl PingProbe {
    pub fn new() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }

    /// Use a different executable, e.g. an absolute path to `ping`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(ip: IpAddr) -> Vec<String> {
        #[cfg(windows)]
        let mut args = vec!["-n".to_string(), "1".to_string(), "-w".to_string(), "1000".to_string()];
        #[cfg(not(windows))]
        let mut args = vec!["-c".to_string(), "1".to_string(), "-w".to_string(), "1".to_string()];

        args.push(ip.to_string());
        args
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachabilityProbe for PingProbe {
    fn probe(&self, ip: IpAddr) {
        if tokio::runtime::Handle::try_current().is_err() {
            debug!(%ip, "No async runtime available, skipping reachability probe");
            return;
        }

        let spawned = Command::new(&self.program)
            .args(Self::args(ip))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false)
            .spawn();

        match spawned {
            Ok(child) => trace!(%ip, pid = ?child.id(), "Reachability probe started"),
            Err(e) => debug!(%ip, error = %e, "Reachability probe could not be started"),
        }
    }
}

/// Build the probe selected by configuration.
pub fn probe_for(enabled: bool) -> Arc<dyn ReachabilityProbe> {
    if enabled {
        Arc::new(PingProbe::new())
    } else {
        Arc::new(NoopProbe)
    }
}
