//! Event sources produced by catalog factories.

use std::fmt;

use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde_json::Value;

use crate::error::StreamError;

/// Position in a stream requested by the client on `subscribe`.
pub type Offset = i64;

/// Asynchronous item sequence that may end with completion or an error.
pub type ItemStream = BoxStream<'static, Result<Value, StreamError>>;

/// Source handed to the batching adapter.
///
/// Array-shaped sources are a distinct variant so the adapter can pass them
/// through as a single batch instead of re-batching them.
pub enum StreamSource {
    /// A complete, static array of items.
    Materialized(Vec<Value>),
    /// A live, possibly unbounded, item stream.
    Live(ItemStream),
}

impl StreamSource {
    /// Wraps a complete set of items.
    #[must_use]
    pub fn materialized(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Materialized(items.into_iter().collect())
    }

    /// Wraps a live stream.
    #[must_use]
    pub fn live<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Value, StreamError>> + Send + 'static,
    {
        Self::Live(stream.boxed())
    }

    /// Returns `true` for array-shaped sources.
    #[must_use]
    pub const fn is_materialized(&self) -> bool {
        matches!(self, Self::Materialized(_))
    }
}

impl fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Materialized(items) => f
                .debug_struct("Materialized")
                .field("len", &items.len())
                .finish(),
            Self::Live(_) => f.write_str("Live(..)"),
        }
    }
}
