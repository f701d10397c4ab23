//! WebSocket connection actor.
//!
//! Runs the read loop for a single WebSocket connection: inbound frames are
//! handed to the [`SubscriptionMultiplexer`] strictly in arrival order, and
//! terminal notices from subscriptions are folded back into its table. A
//! separate writer task owns the socket sink and drains the outbound queue.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::Instrument;

use super::multiplexer::SubscriptionMultiplexer;
use super::session::ConnectionSession;
use super::transport::Transport;
use crate::app_state::AppState;
use crate::domain::{ConnectionId, DomainEventSink};

/// Runs one connection until the client goes away, then tears down every
/// subscription.
pub async fn run_connection(socket: WebSocket, remote_addr: SocketAddr, state: AppState) {
    let connection_id = ConnectionId::new();
    let span = tracing::info_span!(
        "ws_connection",
        connection_id = %connection_id,
        remote_addr = %remote_addr
    );
    serve(socket, connection_id, remote_addr, state)
        .instrument(span)
        .await;
}

async fn serve(
    socket: WebSocket,
    connection_id: ConnectionId,
    remote_addr: SocketAddr,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (transport, mut outbound) = Transport::channel(state.config.outbound_queue_capacity);

    let writer_transport = transport.clone();
    let writer = tokio::spawn(
        async move {
            while let Some(frame) = outbound.recv().await {
                if let Err(e) = ws_tx.send(Message::text(frame)).await {
                    tracing::debug!(error = %e, "ws write failed");
                    writer_transport.mark_closed();
                    break;
                }
            }
            let _ = ws_tx.close().await;
        }
        .in_current_span(),
    );

    let events: Arc<dyn DomainEventSink> = Arc::new(state.event_bus.clone());
    let (mut mux, mut done_rx) = SubscriptionMultiplexer::new(
        ConnectionSession::new(connection_id, remote_addr.to_string()),
        transport.clone(),
        Arc::clone(&state.catalog),
        events,
        state.config.batch_config(),
    );
    tracing::debug!("ws connection opened");

    loop {
        tokio::select! {
            biased;
            // Terminal notice from a subscription
            Some(done) = done_rx.recv() => mux.finish(done),
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => mux.handle_text(text.as_str()).await,
                    Some(Ok(Message::Binary(bytes))) => {
                        tracing::warn!(len = bytes.len(), "binary frame ignored");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "ws read failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    transport.begin_close();
    mux.cleanup();
    drop(mux);
    drop(transport);

    if let Err(e) = writer.await {
        tracing::warn!(error = %e, "ws writer task failed");
    }
    tracing::debug!("ws connection closed");
}
