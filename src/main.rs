// scenebridge/src/main.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use clap::Parser;

use scenebridge::error::AnyResult;
use scenebridge::scene::Scene;
use scenebridge::{config, host, log, server};

/// Scenebridge: serves the scene command protocol for an in-process scene
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config file, if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Start from an empty scene instead of the default one
    #[arg(long)]
    empty: bool,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    // 1. Load configuration
    let cli = Cli::parse();
    let (mut config, warnings) = config::load(cli.config.as_deref()).await?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // 2. Initialize logging
    let log_guard = log::init(&config.log)?;
    tracing::info!("Starting up (v{})", env!("CARGO_PKG_VERSION"));
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    // 3. Main context owning the scene
    let scene = if cli.empty {
        Scene::default()
    } else {
        Scene::with_default_contents()
    };
    let (main_context, host_handle) = host::channel(scene);

    let mut server_handle = server::start(&config, host_handle).await?;
    tracing::info!("Serving on {}", server_handle.local_addr());

    let scene = main_context
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, shutting down..."),
                Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
            }
        })
        .await;
    tracing::debug!("Main context finished with {} objects", scene.object_count());

    server_handle.shutdown().await?;
    if let Some(path) = &config.diagnostics.export_path {
        if let Err(e) = server_handle.export_diagnostics(path).await {
            tracing::error!("Failed to export diagnostics: {}", e);
        }
    }

    tracing::info!("Shutting down");
    drop(log_guard);

    Ok(())
}
