//! Batching adapter: turns an event source into a stream of non-empty
//! batches.
//!
//! Materialized sources become exactly one batch. Live sources are drained
//! greedily: every item that is already ready (up to `max_items`) joins the
//! current batch, and an optional linger window lets a partial batch wait a
//! little for more. Completion and errors are held back until the buffered
//! batch has been emitted, so concatenating all batches always reproduces
//! the source sequence.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;
use tokio::time::Sleep;

use super::{ItemStream, StreamSource};
use crate::error::StreamError;

/// Ordered, non-empty group of stream items delivered in one envelope.
pub type Batch = Vec<Value>;

/// Output of the batching adapter.
pub type BatchStream = BoxStream<'static, Result<Batch, StreamError>>;

/// Grouping policy for live sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    max_items: usize,
    linger: Duration,
}

impl BatchConfig {
    /// Creates a policy. `max_items` is clamped to at least 1.
    #[must_use]
    pub fn new(max_items: usize, linger: Duration) -> Self {
        Self {
            max_items: max_items.max(1),
            linger,
        }
    }

    /// Maximum number of items per batch.
    #[must_use]
    pub const fn max_items(&self) -> usize {
        self.max_items
    }

    /// How long a partial batch may wait for more items.
    #[must_use]
    pub const fn linger(&self) -> Duration {
        self.linger
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new(256, Duration::ZERO)
    }
}

/// Wraps `source` into a stream of batches.
#[must_use]
pub fn batched(source: StreamSource, config: BatchConfig) -> BatchStream {
    match source {
        StreamSource::Materialized(items) if items.is_empty() => stream::empty().boxed(),
        StreamSource::Materialized(items) => stream::once(async move { Ok(items) }).boxed(),
        StreamSource::Live(items) => Batcher::new(items, config).boxed(),
    }
}

struct Batcher {
    source: ItemStream,
    config: BatchConfig,
    buffer: Batch,
    deferred_error: Option<StreamError>,
    exhausted: bool,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl Batcher {
    fn new(source: ItemStream, config: BatchConfig) -> Self {
        Self {
            source,
            config,
            buffer: Vec::new(),
            deferred_error: None,
            exhausted: false,
            deadline: None,
        }
    }

    fn drain_ready(&mut self, cx: &mut Context<'_>) {
        while !self.exhausted && self.buffer.len() < self.config.max_items {
            match self.source.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(item))) => self.buffer.push(item),
                Poll::Ready(Some(Err(err))) => {
                    self.deferred_error = Some(err);
                    self.exhausted = true;
                }
                Poll::Ready(None) => self.exhausted = true,
                Poll::Pending => break,
            }
        }
    }
}

impl Stream for Batcher {
    type Item = Result<Batch, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.drain_ready(cx);

        if this.buffer.is_empty() {
            if let Some(err) = this.deferred_error.take() {
                return Poll::Ready(Some(Err(err)));
            }
            return if this.exhausted {
                Poll::Ready(None)
            } else {
                Poll::Pending
            };
        }

        let full = this.buffer.len() >= this.config.max_items;
        if !full && !this.exhausted && !this.config.linger.is_zero() {
            let linger = this.config.linger;
            let deadline = this
                .deadline
                .get_or_insert_with(|| Box::pin(tokio::time::sleep(linger)));
            if deadline.as_mut().poll(cx).is_pending() {
                return Poll::Pending;
            }
        }

        this.deadline = None;
        Poll::Ready(Some(Ok(std::mem::take(&mut this.buffer))))
    }
}
