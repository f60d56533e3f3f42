// scenebridge/src/server/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! TCP command server embedded in the host application.
//!
//! The server listens on a loopback address and serves one client at a time.
//! Each client sends newline-delimited [`Command`](scenebridge_proto::Command)s
//! and receives exactly one [`Response`](scenebridge_proto::Response) per
//! command, in order. Scene work is handed to the main context through a
//! [`HostHandle`]; the network task never touches the scene itself.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::BridgeConfig;
use crate::error::Result as BridgeResult;
use crate::history::{ConnectionInfo, Diagnostics, DiagnosticsSnapshot};
use crate::host::HostHandle;
use crate::registry::CommandRegistry;

mod connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Stopped,
    Listening,
    Serving(SocketAddr),
}

/// State shared by the server task and its [`ServerHandle`].
pub(crate) struct ServerState {
    pub(crate) registry: CommandRegistry,
    pub(crate) host: HostHandle,
    pub(crate) diagnostics: Mutex<Diagnostics>,
    pub(crate) status: RwLock<ServerStatus>,
    pub(crate) running: AtomicBool,
    pub(crate) host_name: String,
    pub(crate) local_addr: SocketAddr,
    pub(crate) max_request_bytes: usize,
    pub(crate) idle_timeout: Option<Duration>,
}

impl ServerState {
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) async fn set_status(&self, status: ServerStatus) {
        *self.status.write().await = status;
    }

    async fn snapshot(&self) -> DiagnosticsSnapshot {
        let client = match *self.status.read().await {
            ServerStatus::Serving(addr) => Some(addr.to_string()),
            _ => None,
        };
        let connection = ConnectionInfo {
            host: self.host_name.clone(),
            port: self.local_addr.port(),
            is_running: self.is_running(),
            client,
        };
        self.diagnostics.lock().await.snapshot(connection)
    }
}

pub struct ServerHandle {
    state: Arc<ServerState>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    join_handle: Option<JoinHandle<BridgeResult<()>>>,
}

impl ServerHandle {
    /// Address the listener is bound to. Useful when configured with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.state.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub async fn status(&self) -> ServerStatus {
        *self.state.status.read().await
    }

    /// Read-only copy of history, last error and connection info.
    pub async fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.state.snapshot().await
    }

    /// Clears the history ring and the last-error slot.
    pub async fn clear_history(&self) {
        self.state.diagnostics.lock().await.clear();
        tracing::debug!("Command history cleared");
    }

    /// Writes the diagnostics snapshot to `path` as JSON.
    pub async fn export_diagnostics(&self, path: &Path) -> BridgeResult<()> {
        self.diagnostics().await.export(path).await?;
        tracing::info!("Exported diagnostics to {:?}", path);
        Ok(())
    }

    /// Stops the server and waits for the listener task to finish.
    ///
    /// Closes the active client connection, if any, and the listening
    /// socket. Calling it again is a no-op.
    pub async fn shutdown(&mut self) -> BridgeResult<()> {
        self.state.running.store(false, Ordering::SeqCst);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::debug!("Sending shutdown signal to server");
        }
        if let Some(handle) = self.join_handle.take() {
            handle.await??;
        }
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.state.running.store(false, Ordering::SeqCst);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::debug!("Sending shutdown signal to server on drop");
        }
    }
}

/// Binds the listener and spawns the server task.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn spawn_server(
    config: &BridgeConfig,
    registry: CommandRegistry,
    host: HostHandle,
) -> BridgeResult<ServerHandle> {
    let address = config.server.address();
    let listener = TcpListener::bind(&address).await?;
    let local_addr = listener.local_addr()?;
    tracing::debug!("Bound server to {}", local_addr);

    let state = Arc::new(ServerState {
        registry,
        host,
        diagnostics: Mutex::new(Diagnostics::new(config.history.max_items)),
        status: RwLock::new(ServerStatus::Listening),
        running: AtomicBool::new(true),
        host_name: config.server.host.clone(),
        local_addr,
        max_request_bytes: config.server.max_request_bytes,
        idle_timeout: config.server.idle_timeout(),
    });

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let state_clone = state.clone();
    let join_handle = tokio::spawn(async move {
        connection::run_server_loop(listener, state_clone, shutdown_rx).await
    });

    Ok(ServerHandle {
        state,
        shutdown_tx: Some(shutdown_tx),
        join_handle: Some(join_handle),
    })
}

/// Starts the server with the built-in command vocabulary.
pub async fn start(config: &BridgeConfig, host: HostHandle) -> BridgeResult<ServerHandle> {
    spawn_server(config, CommandRegistry::builtin(), host).await
}
