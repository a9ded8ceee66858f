// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server startup

use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use lanshare_core::{
    domain::config::ShareConfigManifest,
    infrastructure::{
        network::resolve_bind_address,
        probe::probe_for,
        storage::{create_storage_provider, StorageBackend},
    },
    presentation::{app, AppState},
};

pub async fn start_server(config: ShareConfigManifest) -> Result<()> {
    let storage = create_storage_provider(StorageBackend::Local {
        base_path: config.spec.storage.directory.clone(),
    })
    .context("Failed to initialize shared directory")?;

    storage
        .ensure_exists()
        .await
        .context("Failed to create shared directory")?;
    storage
        .health_check()
        .await
        .context("Shared directory is not writable")?;

    let probe = probe_for(config.spec.probe.enabled);
    let state = AppState::from_config(&config, storage.clone(), probe)
        .context("Failed to build application state")?;
    let router = app(Arc::new(state));

    let ip = resolve_bind_address(&config.spec.server.bind_address)?;
    let addr = SocketAddr::new(ip, config.spec.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        %addr,
        directory = %storage.root().display(),
        probe = config.spec.probe.enabled,
        "File share listening"
    );
    println!(
        "{}",
        format!("✓ Server running on http://{}", addr).green()
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    info!("File share shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
