// scenebridge/src/client/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Client connector for the command server.
//!
//! [`SceneClient`] keeps one persistent connection and exchanges exactly one
//! response per command. It never returns a transport error to the caller:
//! every failure is reported as an error [`Response`]. After a transport
//! error or timeout the connection is dropped, so the next command starts
//! from a fresh connect and cannot pick up a late response meant for an
//! earlier request.

mod commands;

use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use scenebridge_proto::{write_frame, Command, FrameReader, Params, ProtoError, Response};

use crate::config::ClientConfig;

pub use commands::{CameraSettings, LightingSettings, MaterialSpec, ObjectChanges, ObjectSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Failure of a single exchange.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not connected to host application")]
    NotConnected,

    #[error("No response from host application within {0:?}")]
    Timeout(Duration),

    #[error("Connection closed by host application")]
    Closed,

    #[error("Communication error: {0}")]
    Proto(#[from] ProtoError),
}

struct Connection {
    reader: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

pub struct SceneClient {
    config: ClientConfig,
    state: ConnectionState,
    connection: Option<Connection>,
    connect_attempts: u64,
}

impl SceneClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
            connection: None,
            connect_attempts: 0,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.connection.is_some()
    }

    /// Number of connection attempts made so far, implicit ones included.
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts
    }

    /// Opens a new connection, replacing any existing one.
    ///
    /// Returns `false` when the host application cannot be reached.
    pub async fn connect(&mut self) -> bool {
        self.connection = None;
        self.state = ConnectionState::Connecting;
        self.connect_attempts += 1;

        let address = self.config.address();
        match timeout(self.config.connect_timeout(), TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => {
                let _ = stream.set_nodelay(true);
                let (reader, writer) = stream.into_split();
                self.connection = Some(Connection {
                    reader: FrameReader::new(reader),
                    writer,
                });
                self.state = ConnectionState::Connected;
                tracing::info!("Connected to host application at {}", address);
                true
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to connect to host application at {}: {}", address, e);
                self.state = ConnectionState::Disconnected;
                false
            }
            Err(_) => {
                tracing::error!(
                    "Timed out connecting to host application at {} after {:?}",
                    address,
                    self.config.connect_timeout()
                );
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    /// Closes the connection. Returns `false` if closing failed.
    pub async fn disconnect(&mut self) -> bool {
        self.state = ConnectionState::Disconnected;
        match self.connection.take() {
            Some(mut connection) => match connection.writer.shutdown().await {
                Ok(()) => {
                    tracing::info!("Disconnected from host application");
                    true
                }
                Err(e) => {
                    tracing::error!("Error disconnecting from host application: {}", e);
                    false
                }
            },
            None => true,
        }
    }

    /// Sends one command and waits for its response.
    ///
    /// When not connected, exactly one connect is attempted first.
    pub async fn send_command(&mut self, kind: &str, params: Option<Params>) -> Response {
        if !self.is_connected() && !self.connect().await {
            return Response::error(format!(
                "Not connected to host application at {}",
                self.config.address()
            ));
        }

        let command = Command::with_params(kind, params.unwrap_or_default());
        match self.exchange(&command).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error communicating with host application: {}", e);
                self.connection = None;
                self.state = ConnectionState::Disconnected;
                Response::error(e.to_string())
            }
        }
    }

    async fn exchange(&mut self, command: &Command) -> Result<Response, ClientError> {
        let limit = self.config.response_timeout();
        let connection = self.connection.as_mut().ok_or(ClientError::NotConnected)?;

        tracing::debug!(command = %command.kind, "Sending command");
        write_frame(&mut connection.writer, command).await?;

        match timeout(limit, connection.reader.read_message::<Response>()).await {
            Ok(Ok(Some(response))) => Ok(response),
            Ok(Ok(None)) => Err(ClientError::Closed),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ClientError::Timeout(limit)),
        }
    }
}

impl Default for SceneClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    fn config_for(port: u16) -> ClientConfig {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port,
            connect_timeout_ms: 1000,
            response_timeout_ms: 200,
        }
    }

    /// A port nothing listens on.
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_send_without_server_tries_one_connect() {
        let mut client = SceneClient::new(config_for(closed_port().await));
        assert!(!client.connect().await);
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(client.connect_attempts(), 1);

        let response = client.send_command("get_scene_info", None).await;
        assert!(response.is_error());
        assert!(response
            .message()
            .unwrap()
            .starts_with("Not connected to host application"));
        assert_eq!(client.connect_attempts(), 2);
    }

    #[tokio::test]
    async fn test_timeout_drops_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accepts and reads, never answers.
        let silent = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(_)) = lines.next_line().await {}
        });

        let mut client = SceneClient::new(config_for(port));
        assert!(client.connect().await);
        assert!(client.is_connected());

        let response = client.send_command("get_objects", None).await;
        assert_eq!(
            response.message(),
            Some("No response from host application within 200ms")
        );
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());

        assert!(client.disconnect().await);
        silent.abort();
    }

    #[tokio::test]
    async fn test_exchange_with_line_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let command: Command = serde_json::from_str(&line).unwrap();
            write_frame(&mut writer, &Response::success(json!({ "echo": command.kind })))
                .await
                .unwrap();
            // Close after one reply.
        });

        let mut client = SceneClient::new(config_for(port));
        let response = client.delete_object("Cube").await;
        assert_eq!(response, Response::success(json!({ "echo": "delete_object" })));
        assert_eq!(client.connect_attempts(), 1);
        server.await.unwrap();

        let response = client.get_objects().await;
        assert!(response.is_error());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }
}
