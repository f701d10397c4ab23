//! WebSocket layer: envelope codec, transport, subscriptions, and the
//! per-connection multiplexer.
//!
//! The endpoint at `/ws` accepts `hello`, `subscribe` and `unsubscribe`
//! control messages and pushes `events`, `error` and `complete` envelopes
//! for each named subscription over the same socket.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod multiplexer;
pub mod session;
pub mod subscription;
pub mod transport;
