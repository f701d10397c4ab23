//! Stream layer: event sources, the batching adapter, and the catalog that
//! resolves subscription names to source factories.

pub mod batcher;
pub mod builtin;
pub mod catalog;
pub mod source;

pub use batcher::{Batch, BatchConfig, BatchStream, batched};
pub use catalog::{StreamCatalog, StreamFactory};
pub use source::{ItemStream, Offset, StreamSource};
