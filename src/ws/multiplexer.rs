//! Per-connection subscription multiplexer.
//!
//! Owns the connection's subscription table and processes inbound control
//! messages one at a time. Protocol errors (bad frames, duplicate or unknown
//! ids, unknown types) are logged and dropped; only an unknown stream name
//! and a misbehaving catalog factory are reported back to the client.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::{
    Hello, InboundEnvelope, OutboundEnvelope, Subscribe, SubscriptionId, Unsubscribe, decode,
};
use super::session::{ConnectionHandle, ConnectionSession};
use super::subscription::{EnvelopeObserver, Subscription, SubscriptionDone};
use super::transport::Transport;
use crate::domain::{ConnectionEvent, DomainEvent, DomainEventSink};
use crate::error::GatewayError;
use crate::stream::{BatchConfig, StreamCatalog, batched};

/// Protocol state machine for one connection.
#[derive(Debug)]
pub struct SubscriptionMultiplexer {
    session: ConnectionSession,
    transport: Transport,
    catalog: Arc<StreamCatalog>,
    events: Arc<dyn DomainEventSink>,
    batching: BatchConfig,
    table: HashMap<SubscriptionId, Subscription>,
    done_tx: mpsc::UnboundedSender<SubscriptionDone>,
    next_generation: u64,
    closed: bool,
}

impl SubscriptionMultiplexer {
    /// Creates a multiplexer and the receiver of terminal notices from its
    /// subscriptions. The caller feeds those notices back through
    /// [`Self::finish`].
    #[must_use]
    pub fn new(
        session: ConnectionSession,
        transport: Transport,
        catalog: Arc<StreamCatalog>,
        events: Arc<dyn DomainEventSink>,
        batching: BatchConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SubscriptionDone>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let mux = Self {
            session,
            transport,
            catalog,
            events,
            batching,
            table: HashMap::new(),
            done_tx,
            next_generation: 0,
            closed: false,
        };
        (mux, done_rx)
    }

    /// Connection session state.
    #[must_use]
    pub const fn session(&self) -> &ConnectionSession {
        &self.session
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no subscription is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns `true` if `id` is in the table.
    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.table.contains_key(&id)
    }

    /// Returns `true` once [`Self::cleanup`] has run.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Decodes and handles one inbound text frame.
    pub async fn handle_text(&mut self, text: &str) {
        match decode(text) {
            Ok(envelope) => self.handle(envelope).await,
            Err(e) => {
                tracing::warn!(
                    connection_id = %self.session.connection_id(),
                    error = %e,
                    "dropping invalid message"
                );
            }
        }
    }

    /// Handles one decoded message.
    pub async fn handle(&mut self, envelope: InboundEnvelope) {
        if self.closed {
            tracing::debug!(
                connection_id = %self.session.connection_id(),
                msg_type = envelope.msg_type(),
                "message after close ignored"
            );
            return;
        }
        match envelope {
            InboundEnvelope::Hello(hello) => self.hello(hello),
            InboundEnvelope::Subscribe(subscribe) => self.subscribe(subscribe).await,
            InboundEnvelope::Unsubscribe(unsubscribe) => self.unsubscribe(unsubscribe),
            InboundEnvelope::Unknown { msg_type } => {
                tracing::warn!(
                    connection_id = %self.session.connection_id(),
                    msg_type = %msg_type,
                    "unknown message type"
                );
            }
        }
    }

    fn hello(&mut self, hello: Hello) {
        // A repeated hello overwrites the session id; live subscriptions keep
        // the id they were opened with.
        if let Some(previous) = self.session.set_session_id(hello.session_id) {
            tracing::info!(
                connection_id = %self.session.connection_id(),
                previous_session_id = %previous,
                session_id = self.session.session_id().unwrap_or(""),
                "session id replaced by repeated hello"
            );
        }
        self.emit(ConnectionEvent::ConnectionOpen);
    }

    async fn subscribe(&mut self, subscribe: Subscribe) {
        let Subscribe {
            subscription_id,
            name,
            offset,
        } = subscribe;

        // A finished stream whose done notice is still queued no longer
        // holds its id.
        match self.table.get(&subscription_id) {
            Some(existing) if existing.is_done() => {
                let _ = self.table.remove(&subscription_id);
            }
            Some(_) => {
                tracing::warn!(
                    connection_id = %self.session.connection_id(),
                    subscription_id = %subscription_id,
                    stream = %name,
                    "duplicate subscription id ignored"
                );
                return;
            }
            None => {}
        }

        let Some(factory) = self.catalog.lookup(&name) else {
            let err = GatewayError::StreamNotFound(name);
            tracing::info!(
                connection_id = %self.session.connection_id(),
                subscription_id = %subscription_id,
                error = %err,
                "subscribe rejected"
            );
            self.send_error(subscription_id, &err).await;
            return;
        };

        let handle = ConnectionHandle::new(
            self.session.connection_id(),
            self.session.remote_addr().to_string(),
            self.transport.clone(),
        );
        let source = match factory.open(offset, &handle, self.session.session_id()) {
            Ok(source) => source,
            Err(e) => {
                let err = GatewayError::InvalidSource {
                    name,
                    reason: e.to_string(),
                };
                tracing::error!(
                    connection_id = %self.session.connection_id(),
                    subscription_id = %subscription_id,
                    error = %err,
                    "stream factory did not produce a source"
                );
                self.send_error(subscription_id, &err).await;
                return;
            }
        };

        self.next_generation += 1;
        tracing::debug!(
            connection_id = %self.session.connection_id(),
            subscription_id = %subscription_id,
            stream = %name,
            offset,
            materialized = source.is_materialized(),
            "subscription opened"
        );
        let observer =
            EnvelopeObserver::new(subscription_id, name.clone(), self.transport.clone());
        let subscription = Subscription::spawn(
            subscription_id,
            name,
            self.next_generation,
            batched(source, self.batching),
            observer,
            self.done_tx.clone(),
        );
        self.table.insert(subscription_id, subscription);
    }

    fn unsubscribe(&mut self, unsubscribe: Unsubscribe) {
        let id = unsubscribe.subscription_id;
        match self.table.remove(&id) {
            Some(subscription) => {
                subscription.cancel();
                tracing::debug!(
                    connection_id = %self.session.connection_id(),
                    subscription_id = %id,
                    stream = subscription.name(),
                    "subscription cancelled"
                );
            }
            None => {
                tracing::warn!(
                    connection_id = %self.session.connection_id(),
                    subscription_id = %id,
                    "unsubscribe for unknown subscription id"
                );
            }
        }
    }

    /// Removes a subscription whose stream completed or failed.
    ///
    /// Notices for an id that has since been unsubscribed or reused are
    /// ignored.
    pub fn finish(&mut self, done: SubscriptionDone) {
        let current = self
            .table
            .get(&done.subscription_id)
            .is_some_and(|s| s.generation() == done.generation);
        if current {
            let _ = self.table.remove(&done.subscription_id);
            tracing::debug!(
                connection_id = %self.session.connection_id(),
                subscription_id = %done.subscription_id,
                outcome = ?done.outcome,
                "subscription done"
            );
        }
    }

    /// Tears down every subscription and emits `connection-closed`.
    ///
    /// Only the first call has an effect.
    pub fn cleanup(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let cancelled = self.table.len();
        for (_, subscription) in self.table.drain() {
            subscription.cancel();
        }
        tracing::debug!(
            connection_id = %self.session.connection_id(),
            cancelled,
            "connection cleanup"
        );
        self.emit(ConnectionEvent::ConnectionClosed);
    }

    async fn send_error(&self, subscription_id: SubscriptionId, err: &GatewayError) {
        let _ = self
            .transport
            .send(&OutboundEnvelope::Error {
                subscription_id,
                error: err.to_error_body(),
            })
            .await;
    }

    fn emit(&self, event: ConnectionEvent) {
        self.events.emit(DomainEvent::now(event, self.session.meta()));
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, EventBus};
    use crate::error::StreamError;
    use crate::stream::StreamSource;
    use futures_util::stream;
    use serde_json::{Value, json};
    use tokio::sync::broadcast;

    type FeedSender = mpsc::UnboundedSender<Result<Value, StreamError>>;

    struct Harness {
        mux: SubscriptionMultiplexer,
        done_rx: mpsc::UnboundedReceiver<SubscriptionDone>,
        frames: mpsc::Receiver<String>,
        events: broadcast::Receiver<DomainEvent>,
        feeds: mpsc::UnboundedReceiver<FeedSender>,
    }

    fn catalog(feeds: mpsc::UnboundedSender<FeedSender>) -> StreamCatalog {
        StreamCatalog::builder()
            .register("feed", |_offset, _conn: &ConnectionHandle, _sid: Option<&str>| {
                Ok(StreamSource::live(stream::iter(vec![
                    Ok(json!("a")),
                    Ok(json!("b")),
                    Ok(json!("c")),
                ])))
            })
            .register("snapshot", |offset, _conn: &ConnectionHandle, _sid: Option<&str>| {
                Ok(StreamSource::materialized((0..offset).map(|n| json!(n))))
            })
            .register("forever", |_offset, _conn: &ConnectionHandle, _sid: Option<&str>| {
                Ok(StreamSource::live(stream::pending()))
            })
            .register("broken", |_offset, _conn: &ConnectionHandle, _sid: Option<&str>| {
                Err(StreamError::internal("not a stream"))
            })
            .register("failing", |_offset, _conn: &ConnectionHandle, _sid: Option<&str>| {
                Ok(StreamSource::live(stream::iter(vec![
                    Ok(json!(1)),
                    Err(StreamError::new(503, "upstream unavailable")),
                ])))
            })
            .register("manual", move |_offset, _conn: &ConnectionHandle, _sid: Option<&str>| {
                let (tx, mut rx) = mpsc::unbounded_channel();
                let _ = feeds.send(tx);
                Ok(StreamSource::live(stream::poll_fn(move |cx| rx.poll_recv(cx))))
            })
            .build()
    }

    fn harness() -> Harness {
        let (transport, frames) = Transport::channel(64);
        let bus = EventBus::new(64);
        let events = bus.subscribe();
        let (feeds_tx, feeds) = mpsc::unbounded_channel();
        let (mux, done_rx) = SubscriptionMultiplexer::new(
            ConnectionSession::new(ConnectionId::new(), "127.0.0.1:9000"),
            transport,
            Arc::new(catalog(feeds_tx)),
            Arc::new(bus),
            BatchConfig::default(),
        );
        Harness {
            mux,
            done_rx,
            frames,
            events,
            feeds,
        }
    }

    fn frame_json(frame: Option<String>) -> Value {
        let Some(frame) = frame else {
            panic!("expected an outbound frame");
        };
        serde_json::from_str(&frame).unwrap_or_default()
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn malformed_messages_change_nothing() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"forever","offset":0}"#).await;
        assert_eq!(h.mux.len(), 1);

        for text in [
            "not json",
            "{}",
            r#"{"type":null}"#,
            r#"{"type":"subscribe","subscriptionId":"x","name":"feed","offset":0}"#,
            r#"{"type":"subscribe","subscriptionId":2,"name":"feed"}"#,
            r#"{"type":"unsubscribe","subscriptionId":"1"}"#,
            r#"{"type":"hello","sessionId":5}"#,
            r#"{"type":"teleport","subscriptionId":1}"#,
        ] {
            h.mux.handle_text(text).await;
        }
        settle().await;

        assert_eq!(h.mux.len(), 1);
        assert!(h.mux.contains(SubscriptionId::new(1)));
        assert!(!h.mux.is_closed());
        assert!(h.frames.try_recv().is_err());
        assert!(h.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn hello_emits_connection_open_with_session() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"hello","sessionId":"s1"}"#).await;

        let Ok(event) = h.events.try_recv() else {
            panic!("expected connection-open");
        };
        assert_eq!(event.event, ConnectionEvent::ConnectionOpen);
        assert_eq!(event.meta.session_id.as_deref(), Some("s1"));
        assert_eq!(event.meta.ip_address, "127.0.0.1:9000");
        assert_eq!(h.mux.session().session_id(), Some("s1"));
    }

    #[tokio::test]
    async fn repeated_hello_overwrites_session_id() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"hello","sessionId":"s1"}"#).await;
        h.mux.handle_text(r#"{"type":"hello","sessionId":"s2"}"#).await;

        let _ = h.events.try_recv();
        let Ok(event) = h.events.try_recv() else {
            panic!("expected second connection-open");
        };
        assert_eq!(event.meta.session_id.as_deref(), Some("s2"));
        assert_eq!(h.mux.session().session_id(), Some("s2"));
    }

    #[tokio::test]
    async fn unknown_stream_yields_single_404() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":4,"name":"nope","offset":0}"#).await;
        settle().await;

        assert_eq!(
            frame_json(h.frames.try_recv().ok()),
            json!({"type": "error", "subscriptionId": 4, "error": {"code": 404, "message": "Not found"}})
        );
        assert!(h.frames.try_recv().is_err());
        assert!(h.mux.is_empty());
    }

    #[tokio::test]
    async fn factory_failure_yields_500() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":2,"name":"broken","offset":0}"#).await;

        assert_eq!(
            frame_json(h.frames.try_recv().ok()),
            json!({"type": "error", "subscriptionId": 2, "error": {"code": 500, "message": "Internal Server Error"}})
        );
        assert!(h.mux.is_empty());
    }

    #[tokio::test]
    async fn duplicate_subscription_id_is_ignored() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"manual","offset":0}"#).await;
        let Some(items) = h.feeds.recv().await else {
            panic!("manual stream was not opened");
        };

        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"feed","offset":0}"#).await;
        settle().await;
        assert_eq!(h.mux.len(), 1);
        assert!(h.frames.try_recv().is_err());

        let _ = items.send(Ok(json!("x")));
        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "events", "subscriptionId": 1, "batch": ["x"]})
        );
    }

    #[tokio::test]
    async fn scenario_feed_completes_then_unsubscribe_is_noop() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"hello","sessionId":"s1"}"#).await;
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"feed","offset":0}"#).await;

        let mut delivered = Vec::new();
        loop {
            let frame = frame_json(h.frames.recv().await);
            assert_eq!(frame["subscriptionId"], 1);
            match frame["type"].as_str() {
                Some("events") => {
                    let Some(batch) = frame["batch"].as_array() else {
                        panic!("events without batch");
                    };
                    assert!(!batch.is_empty());
                    delivered.extend(batch.iter().cloned());
                }
                Some("complete") => break,
                other => panic!("unexpected envelope {other:?}"),
            }
        }
        assert_eq!(delivered, vec![json!("a"), json!("b"), json!("c")]);

        let Some(done) = h.done_rx.recv().await else {
            panic!("expected done notice");
        };
        h.mux.finish(done);
        assert!(h.mux.is_empty());

        h.mux.handle_text(r#"{"type":"unsubscribe","subscriptionId":1}"#).await;
        settle().await;
        assert!(h.frames.try_recv().is_err());
        assert!(h.mux.is_empty());
    }

    #[tokio::test]
    async fn materialized_source_arrives_as_one_batch() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":8,"name":"snapshot","offset":500}"#).await;

        let events = frame_json(h.frames.recv().await);
        let expected: Vec<Value> = (0..500).map(|n| json!(n)).collect();
        assert_eq!(events, json!({"type": "events", "subscriptionId": 8, "batch": expected}));
        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "complete", "subscriptionId": 8})
        );
    }

    #[tokio::test]
    async fn stream_failure_sends_error_and_frees_id() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":3,"name":"failing","offset":0}"#).await;
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":4,"name":"forever","offset":0}"#).await;

        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "events", "subscriptionId": 3, "batch": [1]})
        );
        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "error", "subscriptionId": 3, "error": {"code": 503, "message": "upstream unavailable"}})
        );
        let Some(done) = h.done_rx.recv().await else {
            panic!("expected done notice");
        };
        h.mux.finish(done);
        assert!(!h.mux.contains(SubscriptionId::new(3)));
        assert!(h.mux.contains(SubscriptionId::new(4)));
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"manual","offset":0}"#).await;
        let Some(items) = h.feeds.recv().await else {
            panic!("manual stream was not opened");
        };

        let _ = items.send(Ok(json!("first")));
        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "events", "subscriptionId": 1, "batch": ["first"]})
        );

        h.mux.handle_text(r#"{"type":"unsubscribe","subscriptionId":1}"#).await;
        assert!(h.mux.is_empty());
        let _ = items.send(Ok(json!("late")));
        settle().await;

        assert!(h.frames.try_recv().is_err());
        assert!(h.done_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_unknown_id_is_silent() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"forever","offset":0}"#).await;
        h.mux.handle_text(r#"{"type":"unsubscribe","subscriptionId":2}"#).await;
        settle().await;
        assert!(h.mux.contains(SubscriptionId::new(1)));
        assert!(h.frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn id_can_be_reused_after_unsubscribe() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"forever","offset":0}"#).await;
        h.mux.handle_text(r#"{"type":"unsubscribe","subscriptionId":1}"#).await;
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"snapshot","offset":2}"#).await;
        assert!(h.mux.contains(SubscriptionId::new(1)));

        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "events", "subscriptionId": 1, "batch": [0, 1]})
        );
    }

    #[tokio::test]
    async fn completed_id_is_reusable_before_done_notice_is_applied() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"snapshot","offset":1}"#).await;
        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "events", "subscriptionId": 1, "batch": [0]})
        );
        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "complete", "subscriptionId": 1})
        );

        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"snapshot","offset":2}"#).await;
        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "events", "subscriptionId": 1, "batch": [0, 1]})
        );
        assert_eq!(
            frame_json(h.frames.recv().await),
            json!({"type": "complete", "subscriptionId": 1})
        );

        // The first subscription's notice is stale by now; only the second
        // one's notice removes the entry.
        let (Some(a), Some(b)) = (h.done_rx.recv().await, h.done_rx.recv().await) else {
            panic!("expected two done notices");
        };
        let (stale, current) = if a.generation < b.generation { (a, b) } else { (b, a) };
        h.mux.finish(stale);
        assert!(h.mux.contains(SubscriptionId::new(1)));
        h.mux.finish(current);
        assert!(h.mux.is_empty());
    }

    #[tokio::test]
    async fn failed_id_is_reusable_before_done_notice_is_applied() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":3,"name":"failing","offset":0}"#).await;
        let _ = frame_json(h.frames.recv().await);
        assert_eq!(frame_json(h.frames.recv().await)["type"], "error");

        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":3,"name":"forever","offset":0}"#).await;
        assert!(h.mux.contains(SubscriptionId::new(3)));

        let Some(stale) = h.done_rx.recv().await else {
            panic!("expected done notice");
        };
        h.mux.finish(stale);
        assert!(h.mux.contains(SubscriptionId::new(3)));
    }

    #[tokio::test]
    async fn stale_done_notice_keeps_reused_id() {
        let mut h = harness();
        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":1,"name":"forever","offset":0}"#).await;
        h.mux.finish(SubscriptionDone {
            subscription_id: SubscriptionId::new(1),
            generation: 0,
            outcome: crate::ws::subscription::Outcome::Completed,
        });
        assert!(h.mux.contains(SubscriptionId::new(1)));
    }

    #[tokio::test]
    async fn cleanup_cancels_everything_once() {
        let mut h = harness();
        for id in 1..=3 {
            h.mux
                .handle_text(&format!(
                    r#"{{"type":"subscribe","subscriptionId":{id},"name":"forever","offset":0}}"#
                ))
                .await;
        }
        assert_eq!(h.mux.len(), 3);

        h.mux.cleanup();
        h.mux.cleanup();
        assert!(h.mux.is_empty());
        assert!(h.mux.is_closed());

        let Ok(event) = h.events.try_recv() else {
            panic!("expected connection-closed");
        };
        assert_eq!(event.event, ConnectionEvent::ConnectionClosed);
        assert!(h.events.try_recv().is_err());

        h.mux.handle_text(r#"{"type":"subscribe","subscriptionId":9,"name":"snapshot","offset":1}"#).await;
        settle().await;
        assert!(h.mux.is_empty());
        assert!(h.frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn cleanup_silences_emitting_subscriptions() {
        let mut h = harness();
        let mut feeds = Vec::new();
        for id in 1..=3 {
            h.mux
                .handle_text(&format!(
                    r#"{{"type":"subscribe","subscriptionId":{id},"name":"manual","offset":0}}"#
                ))
                .await;
            let Some(items) = h.feeds.recv().await else {
                panic!("manual stream {id} was not opened");
            };
            feeds.push(items);
        }

        // Every subscription is live and delivering before close.
        for (n, items) in feeds.iter().enumerate() {
            let _ = items.send(Ok(json!(n)));
            let frame = frame_json(h.frames.recv().await);
            assert_eq!(frame["type"], "events");
        }

        h.mux.cleanup();
        assert!(h.mux.is_empty());

        for (n, items) in feeds.iter().enumerate() {
            let _ = items.send(Ok(json!(format!("late-{n}"))));
        }
        settle().await;

        assert!(h.frames.try_recv().is_err());
        assert!(h.done_rx.try_recv().is_err());

        let Ok(event) = h.events.try_recv() else {
            panic!("expected connection-closed");
        };
        assert_eq!(event.event, ConnectionEvent::ConnectionClosed);
        assert!(h.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn cleanup_without_subscriptions_still_reports_close() {
        let mut h = harness();
        h.mux.cleanup();
        let Ok(event) = h.events.try_recv() else {
            panic!("expected connection-closed");
        };
        assert_eq!(event.event, ConnectionEvent::ConnectionClosed);
        assert_eq!(event.meta.session_id, None);
    }
}
