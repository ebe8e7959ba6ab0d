//! Connection registry
//!
//! Tracks every live connection and the identity bound to it. The registry is
//! an owned component of the server instance, not ambient state, so tests can
//! run several servers side by side.

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::HandshakeError;

/// Opaque key for a live connection, allocated by the accept loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        ConnectionId(raw)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Message pushed to a connection's writer through its outbound channel.
#[derive(Debug)]
pub enum Outbound {
    Line(String),
    Shutdown,
}

/// Authentication state of a connection. Identity, once bound, is immutable
/// for the record's lifetime; a client reconnects to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRecord {
    Unauthenticated,
    Authenticated { identity: String },
}

struct Entry {
    addr: SocketAddr,
    outbound: UnboundedSender<Outbound>,
    record: ClientRecord,
}

/// Set of live connections keyed by [`ConnectionId`].
///
/// All sends are non-blocking channel pushes; a push to a connection that is
/// mid-disconnect is silently dropped. Callers therefore may hold the
/// registry lock for the duration of a fan-out, which is what serializes one
/// message's fan-out against another's.
#[derive(Default)]
pub struct Registry {
    clients: HashMap<ConnectionId, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// Insert an unauthenticated record for a newly accepted connection.
    pub fn insert(&mut self, id: ConnectionId, addr: SocketAddr, outbound: UnboundedSender<Outbound>) {
        self.clients.insert(
            id,
            Entry {
                addr,
                outbound,
                record: ClientRecord::Unauthenticated,
            },
        );
    }

    /// Remove a record in any authentication state. Returns the peer address
    /// and final record so the caller can emit the right disconnect notice.
    pub fn remove(&mut self, id: ConnectionId) -> Option<(SocketAddr, ClientRecord)> {
        self.clients.remove(&id).map(|e| (e.addr, e.record))
    }

    pub fn identity_of(&self, id: ConnectionId) -> Option<&str> {
        match &self.clients.get(&id)?.record {
            ClientRecord::Authenticated { identity } => Some(identity.as_str()),
            ClientRecord::Unauthenticated => None,
        }
    }

    /// Bind an identity to a connection as part of the login handshake.
    ///
    /// Fails for an empty identity, for a connection that already holds one,
    /// and for an identity already bound to a different live connection. A
    /// failed bind leaves the incumbent holder untouched.
    pub fn bind_identity(&mut self, id: ConnectionId, identity: &str) -> Result<(), HandshakeError> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(HandshakeError::EmptyIdentity);
        }
        if self.clients.values().any(|e| {
            matches!(&e.record, ClientRecord::Authenticated { identity: held } if held == identity)
        }) {
            return Err(HandshakeError::IdentityTaken(identity.to_string()));
        }

        let entry = self
            .clients
            .get_mut(&id)
            .ok_or(HandshakeError::UnknownConnection)?;
        match &entry.record {
            ClientRecord::Authenticated { .. } => Err(HandshakeError::AlreadyAuthenticated),
            ClientRecord::Unauthenticated => {
                entry.record = ClientRecord::Authenticated {
                    identity: identity.to_string(),
                };
                Ok(())
            }
        }
    }

    /// Push a line to every authenticated connection, sender included.
    pub fn send_to_authenticated(&self, text: &str) {
        for entry in self.clients.values() {
            if let ClientRecord::Authenticated { .. } = entry.record {
                let _ = entry.outbound.send(Outbound::Line(text.to_string()));
            }
        }
    }

    /// Push a line to every connection regardless of authentication state.
    pub fn send_to_all(&self, text: &str) {
        for entry in self.clients.values() {
            let _ = entry.outbound.send(Outbound::Line(text.to_string()));
        }
    }

    /// Ask every connection's writer to shut the socket down. Each task
    /// drains its queue first, so a notice enqueued before this call is
    /// attempted before the disconnect lands.
    pub fn shutdown_all(&self) {
        for entry in self.clients.values() {
            let _ = entry.outbound.send(Outbound::Shutdown);
        }
    }

    #[cfg(test)]
    fn identities(&self) -> Vec<&str> {
        self.clients
            .values()
            .filter_map(|e| match &e.record {
                ClientRecord::Authenticated { identity } => Some(identity.as_str()),
                ClientRecord::Unauthenticated => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
