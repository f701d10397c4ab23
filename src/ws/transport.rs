//! Outbound half of a WebSocket connection.
//!
//! [`Transport`] is a cloneable sender feeding the connection's writer task
//! through a bounded queue. It tracks liveness so every send can be dropped
//! cheaply once the socket is going away.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;

use super::messages::{OutboundEnvelope, encode};

/// Liveness of the underlying socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Frames are accepted.
    Open,
    /// The read side ended; teardown is in progress.
    Closing,
    /// The socket is gone.
    Closed,
}

impl TransportState {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closing => 1,
            Self::Closed => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Cloneable handle for writing envelopes to one connection.
#[derive(Debug, Clone)]
pub struct Transport {
    frames: mpsc::Sender<String>,
    state: Arc<AtomicU8>,
}

impl Transport {
    /// Creates a transport and the receiver the writer task drains.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (frames, rx) = mpsc::channel(capacity.max(1));
        let transport = Self {
            frames,
            state: Arc::new(AtomicU8::new(TransportState::Open.to_u8())),
        };
        (transport, rx)
    }

    /// Current liveness.
    #[must_use]
    pub fn state(&self) -> TransportState {
        TransportState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns `true` while frames are accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == TransportState::Open
    }

    /// Moves an open transport to `Closing`.
    pub fn begin_close(&self) {
        let _ = self.state.compare_exchange(
            TransportState::Open.to_u8(),
            TransportState::Closing.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Marks the transport `Closed`.
    pub fn mark_closed(&self) {
        self.state
            .store(TransportState::Closed.to_u8(), Ordering::Release);
    }

    /// Queues one envelope for the writer task.
    ///
    /// Returns `false` when the envelope was dropped: the transport is not
    /// open, the envelope failed to encode, or the writer is gone. Drops are
    /// logged and never retried.
    pub async fn send(&self, envelope: &OutboundEnvelope) -> bool {
        let state = self.state();
        if state != TransportState::Open {
            tracing::debug!(
                ?state,
                subscription_id = %envelope.subscription_id(),
                "transport not open; dropping envelope"
            );
            return false;
        }

        let frame = match encode(envelope) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    subscription_id = %envelope.subscription_id(),
                    error = %e,
                    "failed to encode envelope"
                );
                return false;
            }
        };

        if self.frames.send(frame).await.is_err() {
            self.mark_closed();
            tracing::debug!(
                subscription_id = %envelope.subscription_id(),
                "writer gone; dropping envelope"
            );
            return false;
        }
        true
    }
}
