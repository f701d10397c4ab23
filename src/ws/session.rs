//! Per-connection session state.

use super::transport::Transport;
use crate::domain::{ConnectionId, EventMeta};

/// State of one connection, owned by its multiplexer.
///
/// `connection_id` and `remote_addr` never change. `session_id` is set by
/// `hello`; a repeated `hello` overwrites it.
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    connection_id: ConnectionId,
    remote_addr: String,
    session_id: Option<String>,
}

impl ConnectionSession {
    /// Creates a session with no session id yet.
    #[must_use]
    pub fn new(connection_id: ConnectionId, remote_addr: impl Into<String>) -> Self {
        Self {
            connection_id,
            remote_addr: remote_addr.into(),
            session_id: None,
        }
    }

    /// Connection identifier.
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Remote peer address.
    #[must_use]
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// Session id from the latest `hello`, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Stores a new session id, returning the one it replaced.
    pub fn set_session_id(&mut self, session_id: String) -> Option<String> {
        self.session_id.replace(session_id)
    }

    /// Snapshot of the metadata attached to domain events.
    #[must_use]
    pub fn meta(&self) -> EventMeta {
        EventMeta {
            connection_id: self.connection_id,
            session_id: self.session_id.clone(),
            ip_address: self.remote_addr.clone(),
        }
    }
}

/// Connection view handed to stream factories.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    connection_id: ConnectionId,
    remote_addr: String,
    transport: Transport,
}

impl ConnectionHandle {
    /// Creates a handle.
    #[must_use]
    pub fn new(connection_id: ConnectionId, remote_addr: String, transport: Transport) -> Self {
        Self {
            connection_id,
            remote_addr,
            transport,
        }
    }

    /// Connection identifier.
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Remote peer address.
    #[must_use]
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// Returns `true` while the connection accepts frames.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }
}
