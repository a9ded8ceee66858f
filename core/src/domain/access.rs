// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local network classification for the access gate.
//!
//! A [`PrivateRangeSet`] is parsed once at startup from the configured CIDR
//! blocks and never changes afterwards.

use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use thiserror::Error;

/// The three standard private IPv4 blocks.
pub const DEFAULT_PRIVATE_RANGES: [&str; 3] = ["192.168.0.0/16", "10.0.0.0/8", "172.16.0.0/12"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Access denied. Only local network access is allowed.")]
    Denied { ip: IpAddr },

    #[error("Access denied. Only local network access is allowed.")]
    InvalidAddress { raw: String },
}

#[derive(Debug, Error)]
#[error("Invalid CIDR range '{range}': {source}")]
pub struct RangeParseError {
    pub range: String,
    #[source]
    pub source: ipnet::AddrParseError,
}

/// Immutable set of networks considered "local".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateRangeSet {
    ranges: Vec<IpNet>,
}

impl PrivateRangeSet {
    pub fn parse<I, S>(ranges: I) -> Result<Self, RangeParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ranges = ranges
            .into_iter()
            .map(|range| {
                let range = range.as_ref().trim();
                IpNet::from_str(range)
                    .map(|net| net.trunc())
                    .map_err(|source| RangeParseError {
                        range: range.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[IpNet] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// True if `ip` falls inside at least one range. IPv4-mapped IPv6
    /// addresses are matched as their IPv4 form.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.ranges.iter().any(|net| net.contains(&ip))
    }

    /// Parse and classify a client address. Unparsable input is denied.
    pub fn classify(&self, raw: &str) -> Result<IpAddr, AccessError> {
        let ip = parse_client_ip(raw).ok_or_else(|| AccessError::InvalidAddress {
            raw: raw.to_string(),
        })?;

        if self.contains(ip) {
            Ok(ip)
        } else {
            Err(AccessError::Denied { ip })
        }
    }
}

impl Default for PrivateRangeSet {
    fn default() -> Self {
        Self {
            ranges: DEFAULT_PRIVATE_RANGES
                .iter()
                .filter_map(|range| IpNet::from_str(range).ok())
                .collect(),
        }
    }
}

/// Parse a textual client address, tolerating surrounding whitespace and the
/// bracketed IPv6 form.
pub fn parse_client_ip(raw: &str) -> Option<IpAddr> {
    let trimmed = raw.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    unbracketed.parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}
