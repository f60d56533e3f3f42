// scenebridge/src/server/connection.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Accept loop and per-client request loop.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;

use scenebridge_proto::{codec, write_frame, Command, FrameReader, ProtoError, Response};

use crate::error::Result as BridgeResult;

use super::{ServerState, ServerStatus};

/// Pause after a failed `accept` before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Bytes of a rejected frame kept in the diagnostics.
const FRAME_PREVIEW_BYTES: usize = 200;

/// Runs the accept loop until shutdown.
///
/// Clients are served one at a time, inline: the next connection is only
/// accepted after the current one ends. An `accept` failure is logged and
/// retried; it does not stop the server.
pub(super) async fn run_server_loop(
    listener: TcpListener,
    state: Arc<ServerState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> BridgeResult<()> {
    tracing::info!("Server listening on {}", state.local_addr);
    state
        .diagnostics
        .lock()
        .await
        .record("server_start", json!({ "address": state.local_addr.to_string() }), "Server started");

    while state.is_running() {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, addr)) => {
                        tracing::info!("Client connected from {}", addr);
                        state.set_status(ServerStatus::Serving(addr)).await;
                        state.diagnostics.lock().await.record(
                            "client_connect",
                            json!({ "address": addr.to_string() }),
                            format!("Client connected from {}", addr),
                        );

                        if let Err(e) = handle_connection(stream, &state, &mut shutdown_rx).await {
                            tracing::error!("Connection handler error: {}", e);
                            state
                                .diagnostics
                                .lock()
                                .await
                                .record_error("socket_error", e.to_string(), format!("Client {}", addr));
                        }

                        tracing::info!("Client {} disconnected", addr);
                        state.diagnostics.lock().await.record(
                            "client_disconnect",
                            json!({ "address": addr.to_string() }),
                            format!("Client {} disconnected", addr),
                        );
                        state.set_status(ServerStatus::Listening).await;
                    }
                    Err(e) => {
                        tracing::error!("Listener accept error: {}", e);
                        state
                            .diagnostics
                            .lock()
                            .await
                            .record_error("socket_accept", e.to_string(), "Error accepting connection");
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::debug!("Listener received shutdown signal");
                break;
            }
        }
    }

    drop(listener);
    state.set_status(ServerStatus::Stopped).await;
    state
        .diagnostics
        .lock()
        .await
        .record("server_stop", Value::Null, "Server stopped");
    tracing::info!("Server stopped");
    Ok(())
}

/// Outcome of waiting for the next frame.
enum Incoming {
    Frame(Vec<u8>),
    Closed,
    Idle,
    Shutdown,
    Failed(ProtoError),
}

async fn next_incoming(
    reader: &mut FrameReader<OwnedReadHalf>,
    idle_timeout: Option<Duration>,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Incoming {
    let read = async {
        match idle_timeout {
            Some(limit) => timeout(limit, reader.read_frame()).await.ok(),
            None => Some(reader.read_frame().await),
        }
    };
    tokio::select! {
        result = read => match result {
            Some(Ok(Some(frame))) => Incoming::Frame(frame),
            Some(Ok(None)) => Incoming::Closed,
            Some(Err(e)) => Incoming::Failed(e),
            None => Incoming::Idle,
        },
        _ = shutdown_rx.recv() => Incoming::Shutdown,
    }
}

/// Serves one client until it disconnects, a transport error occurs or the
/// server shuts down.
///
/// Malformed and oversized frames are answered with an error response; the
/// connection stays open. Blank lines are skipped without a response.
async fn handle_connection(
    stream: TcpStream,
    state: &ServerState,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> BridgeResult<()> {
    let _ = stream.set_nodelay(true);
    let (reader, mut writer) = stream.into_split();
    let mut reader = FrameReader::with_max_length(reader, state.max_request_bytes);

    while state.is_running() {
        let frame = match next_incoming(&mut reader, state.idle_timeout, shutdown_rx).await {
            Incoming::Frame(frame) => frame,
            Incoming::Closed => {
                tracing::trace!("Get EOF from client");
                return Ok(());
            }
            Incoming::Idle => {
                tracing::warn!("Client idle timeout");
                let _ = writer.shutdown().await;
                return Ok(());
            }
            Incoming::Shutdown => {
                tracing::debug!("Connection handler received shutdown signal");
                let _ = writer.shutdown().await;
                tracing::debug!("Writer shutdown complete");
                return Ok(());
            }
            Incoming::Failed(e @ ProtoError::FrameTooLarge { .. }) => {
                let message = e.to_string();
                tracing::warn!("{}", message);
                {
                    let mut diagnostics = state.diagnostics.lock().await;
                    diagnostics.record("oversized_request", Value::Null, message.clone());
                    diagnostics.record_error("oversized_request", message.clone(), "");
                }
                write_frame(&mut writer, &Response::error(message)).await?;
                continue;
            }
            Incoming::Failed(e) => {
                tracing::error!("Read error: {}", e);
                return Err(e.into());
            }
        };

        if codec::is_blank(&frame) {
            continue;
        }
        tracing::trace!("Get frame of {} bytes", frame.len());

        let response = process_frame(&frame, state).await;
        tracing::trace!("Send response: {}", response.status());
        write_frame(&mut writer, &response).await?;
    }

    let _ = writer.shutdown().await;
    Ok(())
}

/// Decodes, dispatches and records one request.
async fn process_frame(frame: &[u8], state: &ServerState) -> Response {
    let command: Command = match codec::decode(frame) {
        Ok(command) => command,
        Err(e) => {
            let message = e.to_string();
            let preview = preview(frame);
            tracing::debug!("{}", message);
            let mut diagnostics = state.diagnostics.lock().await;
            diagnostics.record("json_error", json!({ "received": preview }), message.clone());
            diagnostics.record_error("json_error", message.clone(), format!("Received: {}", preview));
            return Response::error(message);
        }
    };
    tracing::debug!(command = %command.kind, "Dispatching command");

    let known = state.registry.contains(&command.kind);
    let description = state.registry.describe(&command);
    let response = state.registry.dispatch(&command, &state.host).await;

    let mut diagnostics = state.diagnostics.lock().await;
    if known {
        diagnostics.record(&command.kind, Value::Object(command.params.clone()), description);
    } else {
        diagnostics.record("unknown_command", json!({ "command": command.kind }), description);
    }
    if let Some(message) = response.message() {
        let details = if known {
            format!("Command failed: {}", command.kind)
        } else {
            format!("Command type '{}' not found in handlers", command.kind)
        };
        diagnostics.record_error(&command.kind, message, details);
    }
    response
}

fn preview(frame: &[u8]) -> String {
    let end = frame.len().min(FRAME_PREVIEW_BYTES);
    String::from_utf8_lossy(&frame[..end]).trim_end().to_string()
}
