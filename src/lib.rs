//! Websocket chatroom server with JSON framing
//!
//! This library provides a single-room chat server: clients connect over a
//! websocket, claim a unique display name, and exchange broadcast messages
//! with everyone else connected. A small HTTP endpoint serves the static
//! chat page and its notification sound.

pub mod error;
pub mod http;
pub mod protocol;
pub mod server;

pub use error::{ChatError, Result};
pub use server::ChatServer;

use std::net::{IpAddr, Ipv4Addr};

/// Chat server configuration
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Interface to bind both listeners on
    pub interface: IpAddr,
    /// Port serving the chat page over HTTP
    pub http_port: u16,
    /// Port accepting websocket connections
    pub websocket_port: u16,
    /// Sender name used for server-originated messages
    pub default_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: 4000,
            websocket_port: 4001,
            default_name: "System".to_string(),
        }
    }
}
