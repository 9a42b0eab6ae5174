//! End-to-end command flows over in-process sessions.
//!
//! Each test wires sessions straight into the registries and drives them
//! through the dispatcher, capturing what the writer task would deliver.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use palaver::protocol::Invocation;
use palaver::server::{CommandTable, Outbound, ServerState, Session};

struct Client {
    session: Arc<Session>,
    rx: mpsc::UnboundedReceiver<Outbound>,
}

impl Client {
    /// Drain the outbound queue: `(sender, text)` pairs of delivered message
    /// frames, plus whether a close marker was queued.
    fn drain(&mut self) -> (Vec<(String, String)>, bool) {
        let mut frames = Vec::new();
        let mut closed = false;
        while let Ok(item) = self.rx.try_recv() {
            match item {
                Outbound::Frame(reply) => frames.push((
                    reply.args[0].as_str().unwrap().to_string(),
                    reply.args[1].as_str().unwrap().to_string(),
                )),
                Outbound::Close => closed = true,
            }
        }
        (frames, closed)
    }

    fn received(&mut self) -> Vec<(String, String)> {
        self.drain().0
    }
}

struct Chatroom {
    state: Arc<ServerState>,
    commands: Arc<CommandTable>,
    next_port: u16,
}

impl Chatroom {
    fn new() -> Self {
        Self {
            state: Arc::new(ServerState::new("System")),
            commands: Arc::new(CommandTable::builtin()),
            next_port: 9000,
        }
    }

    async fn connect(&mut self) -> Client {
        self.next_port += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(Session::new(([127, 0, 0, 1], self.next_port).into(), tx));
        self.state.register(Arc::clone(&session)).await;
        Client { session, rx }
    }

    async fn send(&self, client: &Client, command: &str, args: serde_json::Value) {
        let invocation = Invocation::new(command, serde_json::from_value(args).unwrap());
        Arc::clone(&self.commands)
            .dispatch(&self.state, &client.session, invocation)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn first_name_claim_is_a_join_announcement() {
    let mut room = Chatroom::new();
    let mut alice = room.connect().await;
    let mut bob = room.connect().await;

    room.send(&alice, "name", json!(["Alice"])).await;

    let joined = ("System".to_string(), "Alice has joined the server.".to_string());
    assert_eq!(alice.received(), vec![joined.clone()]);
    assert_eq!(bob.received(), vec![joined]);
}

#[tokio::test]
async fn taken_name_is_refused_without_registry_change() {
    let mut room = Chatroom::new();
    let mut alice = room.connect().await;
    let mut bob = room.connect().await;

    room.send(&alice, "name", json!(["Alice"])).await;
    alice.received();
    bob.received();

    room.send(&bob, "name", json!(["Alice"])).await;

    assert_eq!(
        bob.received(),
        vec![("System".to_string(), "You cannot use that name.".to_string())]
    );
    assert_eq!(alice.received(), vec![]);
    assert!(room.state.is_claimed("Alice").await);
    assert_eq!(bob.session.name().await, None);
}

#[tokio::test]
async fn blank_message_is_refused_locally() {
    let mut room = Chatroom::new();
    let mut alice = room.connect().await;
    let mut bob = room.connect().await;

    room.send(&alice, "name", json!(["Alice"])).await;
    alice.received();
    bob.received();

    room.send(&alice, "message", json!([""])).await;

    assert_eq!(
        alice.received(),
        vec![("System".to_string(), "Messages cannot be blank.".to_string())]
    );
    assert_eq!(bob.received(), vec![]);
}

#[tokio::test]
async fn unnamed_connection_cannot_transmit() {
    let mut room = Chatroom::new();
    let mut alice = room.connect().await;
    let mut bob = room.connect().await;

    room.send(&alice, "message", json!(["hi"])).await;

    assert_eq!(
        alice.received(),
        vec![(
            "System".to_string(),
            "You must set your name before you can transmit.".to_string()
        )]
    );
    assert_eq!(bob.received(), vec![]);
}

#[tokio::test]
async fn who_lists_named_connections_for_the_requester_only() {
    let mut room = Chatroom::new();
    let mut alice = room.connect().await;
    let mut bob = room.connect().await;

    room.send(&alice, "name", json!(["Alice"])).await;
    room.send(&bob, "name", json!(["Bob"])).await;
    alice.received();
    bob.received();

    room.send(&alice, "who", json!([])).await;

    let replies = alice.received();
    assert_eq!(replies.len(), 1);
    let listing = &replies[0].1;
    assert!(listing.starts_with("Who listing:\n"));

    let lines: Vec<&str> = listing.lines().collect();
    assert!(lines[1].starts_with("Alice from 127.0.0.1:"));
    assert!(lines[2].starts_with("Bob from 127.0.0.1:"));
    assert_eq!(bob.received(), vec![]);
}

#[tokio::test]
async fn disconnect_closes_and_announces_the_departure() {
    let mut room = Chatroom::new();
    let mut alice = room.connect().await;
    let mut bob = room.connect().await;

    room.send(&alice, "name", json!(["Alice"])).await;
    alice.received();
    bob.received();

    room.send(&alice, "disconnect", json!([])).await;

    let (frames, closed) = alice.drain();
    assert_eq!(frames, vec![("System".to_string(), "Goodbye.".to_string())]);
    assert!(closed);

    // The transport closing runs the normal teardown path.
    room.state
        .drop_session(&alice.session, "connection closed by peer")
        .await;

    assert_eq!(
        bob.received(),
        vec![("System".to_string(), "Alice has left the server.".to_string())]
    );
    assert_eq!(room.state.connection_count().await, 1);
    assert!(!room.state.is_claimed("Alice").await);
}
