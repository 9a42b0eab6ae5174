//! Shared server state: connection registry, name registry, broadcast
//!
//! All mutation of the registries funnels through the methods here. The name
//! registry is guarded by a single mutex so that check/release/claim runs as
//! one critical section; the connection registry is snapshotted before any
//! fan-out so iteration never races membership changes.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::protocol::Reply;
use crate::server::session::Session;

/// Registries shared by every session.
pub struct ServerState {
    /// Live connections, in connection order
    connections: RwLock<Vec<Arc<Session>>>,
    /// Display names currently in use
    names: Mutex<HashSet<String>>,
    /// Sender name for server-originated messages, permanently reserved
    default_name: String,
}

impl ServerState {
    /// Create the state with the default sender name pre-reserved.
    pub fn new(default_name: impl Into<String>) -> Self {
        let default_name = default_name.into();
        let mut names = HashSet::new();
        names.insert(default_name.clone());

        Self {
            connections: RwLock::new(Vec::new()),
            names: Mutex::new(names),
            default_name,
        }
    }

    /// The sender name used for server-originated messages.
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Add a session to the connection registry.
    pub async fn register(&self, session: Arc<Session>) {
        self.connections.write().await.push(session);
    }

    /// Snapshot of all live sessions, in connection order.
    pub async fn sessions(&self) -> Vec<Arc<Session>> {
        self.connections.read().await.clone()
    }

    /// Number of live sessions.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Check whether a display name is currently claimed.
    pub async fn is_claimed(&self, name: &str) -> bool {
        self.names.lock().await.contains(name)
    }

    /// Atomically release `old` and claim `new`.
    ///
    /// Returns false without touching the registry when `new` is already
    /// claimed. The whole swap runs under one lock, so two connections
    /// racing for the same name cannot both win.
    pub async fn claim_name(&self, old: Option<&str>, new: &str) -> bool {
        let mut names = self.names.lock().await;
        if names.contains(new) {
            return false;
        }
        if let Some(old) = old {
            names.remove(old);
        }
        names.insert(new.to_string());
        true
    }

    /// Release a claimed display name.
    pub async fn release_name(&self, name: &str) {
        self.names.lock().await.remove(name);
    }

    /// Send a message frame to every live session.
    ///
    /// Best-effort per connection: a session whose outbound channel is gone
    /// is skipped, never letting one dead client block the rest. Sessions
    /// joining after the snapshot do not receive the message.
    pub async fn broadcast(&self, sender: &str, text: &str) {
        let sessions = self.sessions().await;
        info!("{}: {}", sender, text);

        for session in sessions {
            if let Err(e) = session.send(Reply::message(sender, text)) {
                warn!("Skipping send to {}: {}", session.addr(), e);
            }
        }
    }

    /// Tear down a session: unregister it, release its name, and announce
    /// the departure.
    ///
    /// Safe to reach from any error path; the name is taken out of the
    /// session exactly once, so a second call cannot double-release or
    /// double-announce.
    pub async fn drop_session(&self, session: &Arc<Session>, reason: &str) {
        {
            let mut connections = self.connections.write().await;
            connections.retain(|s| s.id() != session.id());
        }

        if let Some(name) = session.take_name().await {
            self.release_name(&name).await;
            self.broadcast(&self.default_name, &format!("{} has left the server.", name))
                .await;
        }

        info!("Connection from {} closed: {}", session.addr(), reason);
    }
}
