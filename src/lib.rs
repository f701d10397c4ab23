//! # stream-gateway
//!
//! WebSocket push gateway that multiplexes named event-stream subscriptions
//! over a single connection.
//!
//! A client identifies its session with `hello`, opens streams with
//! `subscribe {subscriptionId, name, offset}` and closes them with
//! `unsubscribe`. Every stream is resolved through the [`stream::StreamCatalog`],
//! batched, and pushed back as `events` envelopes tagged with the client's
//! subscription id, followed by `complete` or `error`.
//!
//! ## Architecture
//!
//! ```text
//! Client (WebSocket)
//!     │
//!     ├── WS Handler / Connection actor (ws/)
//!     │     ├── Envelope codec
//!     │     └── SubscriptionMultiplexer ── Subscription tasks
//!     │
//!     ├── StreamCatalog → StreamSource → Batching adapter (stream/)
//!     │
//!     └── EventBus (domain/) → domain event consumers
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod stream;
pub mod ws;
