//! Per-connection session lifecycle
//!
//! Each accepted socket gets one `Session` and two tasks: a writer draining
//! the session's outbound queue into the websocket, and the read pump
//! decoding inbound frames into command invocations. Registry operations
//! never touch the socket directly, so a slow client cannot stall anyone
//! else.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ChatError, Result};
use crate::protocol::{Invocation, Reply};
use crate::server::commands::CommandTable;
use crate::server::state::ServerState;

/// One unit on a session's outbound queue.
#[derive(Debug)]
pub enum Outbound {
    /// A frame to deliver
    Frame(Reply),
    /// Flush and close the socket
    Close,
}

/// One live connection.
pub struct Session {
    /// Registry identity
    id: Uuid,
    /// Peer address
    addr: SocketAddr,
    /// Claimed display name; empty until the `name` command succeeds
    name: RwLock<Option<String>>,
    /// Outbound queue, drained by this session's writer task
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Session {
    pub fn new(addr: SocketAddr, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            id: Uuid::new_v4(),
            addr,
            name: RwLock::new(None),
            outbound,
        }
    }

    /// Registry identity of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Peer address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Claimed display name, if any.
    pub async fn name(&self) -> Option<String> {
        self.name.read().await.clone()
    }

    /// Record the claimed display name.
    pub async fn set_name(&self, name: &str) {
        *self.name.write().await = Some(name.to_string());
    }

    /// Take the claimed name out of the session, leaving it unnamed.
    pub async fn take_name(&self) -> Option<String> {
        self.name.write().await.take()
    }

    /// Enqueue a frame for delivery. Never blocks on the socket.
    pub fn send(&self, reply: Reply) -> Result<()> {
        debug!("Queueing {} frame for {}", reply.name, self.addr);
        self.outbound
            .send(Outbound::Frame(reply))
            .map_err(|_| ChatError::connection(format!("connection {} is gone", self.addr)))
    }

    /// Flush pending frames, then close the socket.
    pub fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

/// Drive one accepted socket through its whole lifetime.
///
/// Teardown runs exactly once, whichever path ends the session: peer close,
/// protocol violation, a handler fault, or the `disconnect` command.
pub async fn run(
    state: Arc<ServerState>,
    commands: Arc<CommandTable>,
    stream: TcpStream,
    addr: SocketAddr,
) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("Websocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (mut sink, mut source) = socket.split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let session = Arc::new(Session::new(addr, outbound_tx));
    state.register(Arc::clone(&session)).await;
    info!("Connection from {} opened", addr);

    let _ = session.send(Reply::message(state.default_name(), "Welcome to the chatroom."));
    let _ = session.send(Reply::message(
        "Suggestion",
        "Type /name followed by your desired name to set your name.",
    ));

    let writer = tokio::spawn(async move {
        while let Some(out) = outbound_rx.recv().await {
            match out {
                Outbound::Frame(reply) => {
                    let text = match reply.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode frame: {}", e);
                            continue;
                        }
                    };
                    if sink.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    let reason = loop {
        match source.next().await {
            Some(Ok(Message::Text(text))) => {
                let invocation = match Invocation::decode(text.as_str()) {
                    Ok(invocation) => invocation,
                    Err(e) => break e.to_string(),
                };
                if let Err(e) = Arc::clone(&commands)
                    .dispatch(&state, &session, invocation)
                    .await
                {
                    break e.to_string();
                }
            }
            Some(Ok(Message::Binary(_))) => {
                break "binary frames are not supported".to_string();
            }
            Some(Ok(Message::Close(_))) | None => {
                break "connection closed by peer".to_string();
            }
            // Ping/pong is answered by the websocket layer.
            Some(Ok(_)) => {}
            Some(Err(e)) => break e.to_string(),
        }
    };

    session.close();
    state.drop_session(&session, &reason).await;
    let _ = writer.await;
}
