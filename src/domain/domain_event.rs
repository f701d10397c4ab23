//! Connection lifecycle events forwarded to the ingestion sink.
//!
//! Each [`DomainEvent`] pairs the business occurrence with a metadata
//! snapshot of the connection taken at emission time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ConnectionId;

/// Business-level occurrence on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionEvent {
    /// The client identified its session with a `hello` message.
    ConnectionOpen,
    /// The transport closed and every subscription was torn down.
    ConnectionClosed,
}

impl ConnectionEvent {
    /// Returns the event name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionOpen => "connection-open",
            Self::ConnectionClosed => "connection-closed",
        }
    }
}

/// Connection metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    /// Connection the event happened on.
    pub connection_id: ConnectionId,
    /// Session id current at emission time, if a `hello` was received.
    pub session_id: Option<String>,
    /// Remote address of the peer.
    pub ip_address: String,
}

/// `(event, meta)` record emitted to a [`super::DomainEventSink`].
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    /// What happened.
    pub event: ConnectionEvent,
    /// Connection snapshot at emission time.
    pub meta: EventMeta,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn now(event: ConnectionEvent, meta: EventMeta) -> Self {
        Self {
            event,
            meta,
            timestamp: Utc::now(),
        }
    }
}
