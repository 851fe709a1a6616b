//! Core ETL (Extract, Transform) abstractions
//!
//! Sources of items (server listings, extract files) implement [`Extractor`];
//! per-item conversions implement [`Transformer`].

mod extract;
mod transform;

pub use extract::Extractor;
pub use transform::Transformer;
