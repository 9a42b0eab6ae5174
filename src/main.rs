//! Websocket chatroom server
//!
//! Serves the chat page over HTTP on one port and accepts websocket
//! connections on another. Clients claim a display name with `/name` and
//! everything they say is broadcast to everyone connected.

use std::net::IpAddr;

use clap::Parser;

use palaver::{http, ChatConfig, ChatServer};

#[derive(Parser, Debug)]
#[command(name = "palaver", about = "A small websocket chatroom server")]
struct Cli {
    /// The interface to bind on
    #[arg(short, long, default_value = "0.0.0.0")]
    interface: IpAddr,

    /// The port to listen for HTTP requests
    #[arg(short = 'p', long, default_value_t = 4000)]
    http_port: u16,

    /// The port to listen for websocket connections
    #[arg(short = 'w', long, default_value_t = 4001)]
    websocket_port: u16,

    /// The default name to use when sending messages
    #[arg(short, long, default_value = "System")]
    default_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ChatConfig {
        interface: cli.interface,
        http_port: cli.http_port,
        websocket_port: cli.websocket_port,
        default_name: cli.default_name,
    };

    let server = ChatServer::new(config.clone());
    let pages = tokio::spawn(http::serve(config));

    tokio::select! {
        result = server.run() => result?,
        result = pages => result??,
    }

    Ok(())
}
