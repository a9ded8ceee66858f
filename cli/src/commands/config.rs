// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use lanshare_core::domain::config::{ShareConfigManifest, CONFIG_PATH_ENV};

pub const SAMPLE_CONFIG: &str = include_str!("../../templates/lanshare.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./lanshare.yaml)
        #[arg(short, long, default_value = "./lanshare.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ShareConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./lanshare.yaml");
        println!("  4. ~/.lanshare/config.yaml");
        println!("  5. /etc/lanshare/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Server:".bold());
    println!("  Bind address: {}", config.spec.server.bind_address);
    println!("  Port: {}", config.spec.server.port);
    println!("  Index page: {}", config.spec.server.index_file.display());
    println!();

    println!("{}", "Storage:".bold());
    println!("  Directory: {}", config.spec.storage.directory.display());
    println!("  Max file size: {} bytes", config.spec.limits.max_file_bytes);
    println!("  Max total size: {} bytes", config.spec.limits.max_total_bytes);
    println!("  Max request size: {} bytes", config.spec.limits.max_request_bytes);
    println!();

    println!("{}", "Network:".bold());
    for range in &config.spec.network.allowed_ranges {
        println!("  - {}", range);
    }
    println!("  Trust X-Forwarded-For: {}", config.spec.network.trust_forwarded_for);
    println!(
        "  Reachability probe: {}",
        if config.spec.probe.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        }
    );
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ShareConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    std::fs::write(&output, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
