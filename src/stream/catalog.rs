//! Registry mapping stream names to source factories.
//!
//! The catalog is assembled once at startup with [`StreamCatalog::builder`]
//! and shared read-only across connections.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Offset, StreamSource};
use crate::error::StreamError;
use crate::ws::session::ConnectionHandle;

/// Produces an event source for one subscription.
///
/// An `Err` means the factory could not hand back a streamable source; the
/// multiplexer reports it to the client as a 500 and creates no
/// subscription.
pub trait StreamFactory: Send + Sync {
    /// Opens a source starting at `offset` for the given connection.
    ///
    /// # Errors
    ///
    /// Returns a [`StreamError`] if no source can be produced.
    fn open(
        &self,
        offset: Offset,
        connection: &ConnectionHandle,
        session_id: Option<&str>,
    ) -> Result<StreamSource, StreamError>;
}

impl<F> StreamFactory for F
where
    F: Fn(Offset, &ConnectionHandle, Option<&str>) -> Result<StreamSource, StreamError>
        + Send
        + Sync,
{
    fn open(
        &self,
        offset: Offset,
        connection: &ConnectionHandle,
        session_id: Option<&str>,
    ) -> Result<StreamSource, StreamError> {
        self(offset, connection, session_id)
    }
}

/// Immutable name → factory map.
#[derive(Clone, Default)]
pub struct StreamCatalog {
    factories: BTreeMap<String, Arc<dyn StreamFactory>>,
}

impl StreamCatalog {
    /// Starts an empty catalog builder.
    #[must_use]
    pub fn builder() -> StreamCatalogBuilder {
        StreamCatalogBuilder::default()
    }

    /// Resolves a stream name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn StreamFactory>> {
        self.factories.get(name).map(Arc::clone)
    }

    /// Registered stream names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Number of registered streams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no streams are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for StreamCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCatalog")
            .field("streams", &self.names())
            .finish()
    }
}

/// Builder for [`StreamCatalog`]. Registering a name twice keeps the last
/// factory.
#[derive(Default)]
pub struct StreamCatalogBuilder {
    factories: BTreeMap<String, Arc<dyn StreamFactory>>,
}

impl StreamCatalogBuilder {
    /// Registers a closure factory under `name`.
    #[must_use]
    pub fn register<F>(self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Offset, &ConnectionHandle, Option<&str>) -> Result<StreamSource, StreamError>
            + Send
            + Sync
            + 'static,
    {
        self.register_factory(name, Arc::new(factory))
    }

    /// Registers a shared factory under `name`.
    #[must_use]
    pub fn register_factory(
        mut self,
        name: impl Into<String>,
        factory: Arc<dyn StreamFactory>,
    ) -> Self {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            tracing::warn!(stream = %name, "stream factory registered twice; keeping the last");
        }
        self
    }

    /// Freezes the catalog.
    #[must_use]
    pub fn build(self) -> StreamCatalog {
        StreamCatalog {
            factories: self.factories,
        }
    }
}

impl fmt::Debug for StreamCatalogBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCatalogBuilder")
            .field("streams", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
