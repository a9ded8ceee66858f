// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Listener address discovery.
//!
//! `bind_address: auto` binds the first up, non-loopback IPv4 address found
//! on the host's interfaces, so the share is reachable from the LAN without
//! being exposed on every interface.

use std::net::{IpAddr, Ipv4Addr};

use anyhow::Context;
use tracing::{debug, trace};

pub const AUTO_BIND: &str = "auto";

/// First up, non-loopback, non-link-local IPv4 address on this host.
pub fn first_lan_ipv4() -> Option<Ipv4Addr> {
    for iface in netdev::get_interfaces() {
        if !iface.is_up() {
            trace!(interface = %iface.name, "skipping down interface");
            continue;
        }

        for net in &iface.ipv4 {
            let addr = net.addr();
            if addr.is_loopback() || addr.is_link_local() || addr.is_unspecified() {
                continue;
            }
            debug!(interface = %iface.name, %addr, "discovered LAN address");
            return Some(addr);
        }
    }
    None
}

/// Resolve the configured bind address, expanding `auto`.
pub fn resolve_bind_address(configured: &str) -> anyhow::Result<IpAddr> {
    let configured = configured.trim();
    if configured.eq_ignore_ascii_case(AUTO_BIND) {
        return first_lan_ipv4()
            .map(IpAddr::V4)
            .context("Unable to determine a LAN IPv4 address; set spec.server.bind_address explicitly");
    }

    configured
        .parse::<IpAddr>()
        .with_context(|| format!("Invalid bind address: '{}'", configured))
}
