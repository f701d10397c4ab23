//! Streams shipped with the gateway binary.
//!
//! | Name        | Shape        | Behaviour                                        |
//! |-------------|--------------|--------------------------------------------------|
//! | `ticker`    | live         | `{seq, at}` every interval, `seq` from `offset`  |
//! | `countdown` | live, finite | `offset`, `offset - 1`, ..., `0`, then completes |
//! | `session`   | materialized | one item describing the caller's connection      |

use std::time::Duration;

use chrono::Utc;
use futures_util::stream;
use serde_json::json;
use tokio::time::MissedTickBehavior;

use super::{Offset, StreamCatalog, StreamSource};
use crate::error::StreamError;
use crate::ws::session::ConnectionHandle;

/// Builds the catalog served by the gateway binary.
#[must_use]
pub fn default_catalog(ticker_interval: Duration) -> StreamCatalog {
    StreamCatalog::builder()
        .register("ticker", move |offset, _conn: &ConnectionHandle, _sid: Option<&str>| {
            Ok(ticker(offset, ticker_interval))
        })
        .register("countdown", |offset, _conn: &ConnectionHandle, _sid: Option<&str>| {
            Ok(countdown(offset))
        })
        .register("session", |_offset, conn: &ConnectionHandle, sid: Option<&str>| {
            Ok(session_info(conn, sid))
        })
        .build()
}

/// Infinite stream emitting one item per `period`.
#[must_use]
pub fn ticker(start: Offset, period: Duration) -> StreamSource {
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    StreamSource::live(stream::unfold(
        (interval, start),
        |(mut interval, seq)| async move {
            interval.tick().await;
            let item = json!({ "seq": seq, "at": Utc::now().to_rfc3339() });
            Some((Ok(item), (interval, seq.saturating_add(1))))
        },
    ))
}

/// Finite stream counting down from `from` to zero.
///
/// A negative start fails the stream instead of completing it.
#[must_use]
pub fn countdown(from: Offset) -> StreamSource {
    if from < 0 {
        return StreamSource::live(stream::once(async move {
            Err(StreamError::new(
                400,
                format!("countdown offset must be non-negative, got {from}"),
            ))
        }));
    }
    StreamSource::live(stream::iter((0..=from).rev().map(|n| Ok(json!(n)))))
}

/// Single-item snapshot of the caller's connection.
#[must_use]
pub fn session_info(connection: &ConnectionHandle, session_id: Option<&str>) -> StreamSource {
    StreamSource::materialized([json!({
        "connectionId": connection.connection_id().to_string(),
        "remoteAddr": connection.remote_addr(),
        "sessionId": session_id,
    })])
}
