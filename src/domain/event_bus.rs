//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel and is the
//! default [`DomainEventSink`]. Connections emit lifecycle events through
//! the sink; downstream consumers (the ingestion pipeline, the event logger
//! in `main`) subscribe to the bus.

use tokio::sync::broadcast;

use super::DomainEvent;

/// Destination for domain events raised by a connection.
///
/// Implementations must not block: `emit` is called from the connection's
/// actor loop.
pub trait DomainEventSink: Send + Sync + std::fmt::Debug {
    /// Forwards one event to the sink.
    fn emit(&self, event: DomainEvent);
}

/// Broadcast bus for [`DomainEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: DomainEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl DomainEventSink for EventBus {
    fn emit(&self, event: DomainEvent) {
        let _ = self.publish(event);
    }
}

/// Logs every event published on `bus` until the bus closes.
pub async fn log_domain_events(bus: EventBus) {
    let mut rx = bus.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => tracing::info!(
                event = event.event.as_str(),
                connection_id = %event.meta.connection_id,
                session_id = event.meta.session_id.as_deref().unwrap_or(""),
                ip_address = %event.meta.ip_address,
                "domain event"
            ),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "domain event logger lagged behind event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
