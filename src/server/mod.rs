//! Websocket chat server implementation
//!
//! This module provides the chat server core: the websocket accept loop, the
//! shared connection/name registries, the command dispatcher, and the
//! per-connection session lifecycle.

pub mod commands;
pub mod session;
pub mod state;

pub use commands::CommandTable;
pub use session::{Outbound, Session};
pub use state::ServerState;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::error::Result;
use crate::ChatConfig;

/// Websocket chat server.
pub struct ChatServer {
    state: Arc<ServerState>,
    commands: Arc<CommandTable>,
    config: ChatConfig,
}

impl ChatServer {
    /// Create a server, pre-reserving the default sender name.
    pub fn new(config: ChatConfig) -> Self {
        Self {
            state: Arc::new(ServerState::new(config.default_name.clone())),
            commands: Arc::new(CommandTable::builtin()),
            config,
        }
    }

    /// The shared registries.
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Accept websocket connections until the listener fails.
    pub async fn run(&self) -> Result<()> {
        let addr = SocketAddr::new(self.config.interface, self.config.websocket_port);
        let listener = TcpListener::bind(addr).await?;
        info!("Chat server listening on ws://{}", addr);

        loop {
            let (stream, peer) = listener.accept().await?;
            let state = Arc::clone(&self.state);
            let commands = Arc::clone(&self.commands);
            tokio::spawn(session::run(state, commands, stream, peer));
        }
    }
}
