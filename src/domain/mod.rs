//! Domain layer: connection identity, lifecycle events, and the event sink.

pub mod connection_id;
pub mod domain_event;
pub mod event_bus;

pub use connection_id::ConnectionId;
pub use domain_event::{ConnectionEvent, DomainEvent, EventMeta};
pub use event_bus::{DomainEventSink, EventBus};
