//! A single live subscription and the observer that turns its batches into
//! envelopes.
//!
//! Each [`Subscription`] owns a delivery task and the
//! [`CancellationToken`] that stops it. The task reports a terminal outcome
//! back to the multiplexer through [`SubscriptionDone`]; removing the entry
//! from the table is the multiplexer's job. The subscription is flagged done
//! before its terminal envelope is written, so a client that has seen
//! `complete` or `error` may immediately reuse the id.
//!
//! # Cancellation
//!
//! Cancelling is idempotent and may race with an in-flight delivery: at most
//! one envelope that was already being written can still reach the
//! transport. Nothing is guaranteed to arrive after [`Subscription::cancel`]
//! returns.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::messages::{OutboundEnvelope, SubscriptionId};
use super::transport::Transport;
use crate::error::{ErrorBody, StreamError};
use crate::stream::{Batch, BatchStream};

/// Receives the output of one batched stream.
///
/// The delivery loop calls `on_batch` zero or more times followed by at
/// most one of `on_error` / `on_complete`, never concurrently.
pub trait SubscriptionObserver: Send {
    /// Handles one non-empty batch.
    fn on_batch(&mut self, batch: Batch) -> impl Future<Output = ()> + Send;

    /// Handles the stream failing. No further calls follow.
    fn on_error(&mut self, error: StreamError) -> impl Future<Output = ()> + Send;

    /// Handles the stream completing. No further calls follow.
    fn on_complete(&mut self) -> impl Future<Output = ()> + Send;
}

/// Observer writing `events` / `error` / `complete` envelopes to a
/// transport.
#[derive(Debug, Clone)]
pub struct EnvelopeObserver {
    subscription_id: SubscriptionId,
    name: String,
    transport: Transport,
}

impl EnvelopeObserver {
    /// Creates an observer for `subscription_id`.
    #[must_use]
    pub fn new(subscription_id: SubscriptionId, name: String, transport: Transport) -> Self {
        Self {
            subscription_id,
            name,
            transport,
        }
    }
}

impl SubscriptionObserver for EnvelopeObserver {
    async fn on_batch(&mut self, batch: Batch) {
        let _ = self
            .transport
            .send(&OutboundEnvelope::Events {
                subscription_id: self.subscription_id,
                batch,
            })
            .await;
    }

    async fn on_error(&mut self, error: StreamError) {
        tracing::warn!(
            subscription_id = %self.subscription_id,
            stream = %self.name,
            error = %error,
            "subscription stream failed"
        );
        let _ = self
            .transport
            .send(&OutboundEnvelope::Error {
                subscription_id: self.subscription_id,
                error: ErrorBody::from(&error),
            })
            .await;
    }

    async fn on_complete(&mut self) {
        tracing::debug!(
            subscription_id = %self.subscription_id,
            stream = %self.name,
            "subscription stream completed"
        );
        let _ = self
            .transport
            .send(&OutboundEnvelope::Complete {
                subscription_id: self.subscription_id,
            })
            .await;
    }
}

/// Sets `done` before forwarding a terminal callback.
struct MarkDone<O> {
    inner: O,
    done: Arc<AtomicBool>,
}

impl<O: SubscriptionObserver> SubscriptionObserver for MarkDone<O> {
    async fn on_batch(&mut self, batch: Batch) {
        self.inner.on_batch(batch).await;
    }

    async fn on_error(&mut self, error: StreamError) {
        self.done.store(true, Ordering::Release);
        self.inner.on_error(error).await;
    }

    async fn on_complete(&mut self) {
        self.done.store(true, Ordering::Release);
        self.inner.on_complete().await;
    }
}

/// How a delivery loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The source completed.
    Completed,
    /// The source failed.
    Failed,
    /// The subscription was cancelled.
    Cancelled,
}

/// Terminal notice sent from a delivery task to its multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionDone {
    /// Subscription that finished.
    pub subscription_id: SubscriptionId,
    /// Generation of the finished subscription, to ignore stale notices
    /// after the id was reused.
    pub generation: u64,
    /// Why it finished.
    pub outcome: Outcome,
}

/// Pumps `batches` into `observer` until the stream ends or `cancel` fires.
pub async fn deliver<O: SubscriptionObserver>(
    mut batches: BatchStream,
    mut observer: O,
    cancel: CancellationToken,
) -> Outcome {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Outcome::Cancelled,
            next = batches.next() => next,
        };
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }
        match next {
            Some(Ok(batch)) => observer.on_batch(batch).await,
            Some(Err(error)) => {
                observer.on_error(error).await;
                return Outcome::Failed;
            }
            None => {
                observer.on_complete().await;
                return Outcome::Completed;
            }
        }
    }
}

/// Live binding from a client-chosen id to one batched stream.
#[derive(Debug)]
pub struct Subscription {
    name: String,
    generation: u64,
    cancel: CancellationToken,
    done: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Spawns the delivery task for `batches`.
    ///
    /// When the stream completes or fails, a [`SubscriptionDone`] is sent on
    /// `done`. Cancellation sends nothing.
    #[must_use]
    pub fn spawn<O>(
        id: SubscriptionId,
        name: String,
        generation: u64,
        batches: BatchStream,
        observer: O,
        done: mpsc::UnboundedSender<SubscriptionDone>,
    ) -> Self
    where
        O: SubscriptionObserver + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let done_flag = Arc::new(AtomicBool::new(false));
        let observer = MarkDone {
            inner: observer,
            done: Arc::clone(&done_flag),
        };
        let task = tokio::spawn(async move {
            let outcome = deliver(batches, observer, token).await;
            if outcome != Outcome::Cancelled {
                let _ = done.send(SubscriptionDone {
                    subscription_id: id,
                    generation,
                    outcome,
                });
            }
        });
        Self {
            name,
            generation,
            cancel,
            done: done_flag,
            task,
        }
    }

    /// Requested stream name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connection-local generation number.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Stops further delivery. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns `true` once the stream has reached a terminal state or the
    /// delivery task has exited.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire) || self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
