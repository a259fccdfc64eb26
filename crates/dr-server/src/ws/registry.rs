//! In-memory registry of connected browser agents.
//!
//! Membership is mutated by the accept path (on upgrade) and by each
//! handler's close transition, and read by the broadcaster. `DashMap`
//! shards give shared access for iteration and exclusive access per shard
//! for mutation.

use std::fmt;
use std::net::SocketAddr;

use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Channel sender capable of pushing WS frames to a connected agent.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Identity of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Handle kept for each connected agent.
#[derive(Debug, Clone)]
pub struct AgentConnection {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub tx: WsSender,
    pub connected_at: DateTime<Utc>,
}

impl AgentConnection {
    pub fn new(peer: SocketAddr, tx: WsSender) -> Self {
        Self {
            id: ConnectionId::new(),
            peer,
            tx,
            connected_at: Utc::now(),
        }
    }

    /// Whether the connection's writer is still accepting frames.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a frame for this agent. Fails once the writer has gone away.
    pub fn send(&self, msg: Message) -> Result<(), mpsc::error::SendError<Message>> {
        self.tx.send(msg)
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    agents: DashMap<ConnectionId, AgentConnection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            agents: DashMap::new(),
        }
    }

    /// Add a connection. Returns `false` (and keeps the existing entry) if
    /// the id is already present.
    pub fn register(&self, conn: AgentConnection) -> bool {
        let id = conn.id;
        let peer = conn.peer;
        let inserted = match self.agents.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(conn);
                true
            }
        };
        if inserted {
            tracing::info!(conn_id = %id, %peer, agents = self.agents.len(), "Agent registered");
        }
        inserted
    }

    /// Remove a connection. Removing an absent id is a no-op.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        match self.agents.remove(id) {
            Some((_, conn)) => {
                tracing::info!(
                    conn_id = %id,
                    peer = %conn.peer,
                    connected_secs = (Utc::now() - conn.connected_at).num_seconds(),
                    agents = self.agents.len(),
                    "Agent unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Owned copy of the current membership; no lock is held after return.
    pub fn snapshot(&self) -> Vec<AgentConnection> {
        self.agents.iter().map(|entry| entry.value().clone()).collect()
    }

    #[cfg(test)]
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
