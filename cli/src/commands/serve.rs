// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `lanshare serve`

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use lanshare_core::domain::config::ShareConfigManifest;

use crate::server;

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Address to bind, or "auto" for the first LAN IPv4 address
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port (default: 8088)
    #[arg(long)]
    pub port: Option<u16>,

    /// Shared directory (default: ./uploads)
    #[arg(long, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Flags win over file and environment settings.
    pub fn apply(&self, config: &mut ShareConfigManifest) {
        if let Some(host) = &self.host {
            config.spec.server.bind_address = host.clone();
        }
        if let Some(port) = self.port {
            config.spec.server.port = port;
        }
        if let Some(dir) = &self.storage_dir {
            config.spec.storage.directory = dir.clone();
        }
    }
}

pub async fn handle_command(args: ServeArgs, config_override: Option<PathBuf>) -> Result<()> {
    let mut config = ShareConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    args.apply(&mut config);

    config
        .validate()
        .context("Configuration validation failed")?;

    server::start_server(config).await
}
