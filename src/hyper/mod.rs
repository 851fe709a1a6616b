//! Columnar extract (`.hyper`) access
//!
//! [`ExtractEngine`] and [`ExtractReader`] are the seam to the Hyper engine;
//! [`HyperServer`] is the production backend and [`ExtractFileExtractor`]
//! turns a directory of extract files into scanned tables.

mod engine;
mod extractor;
mod server;

pub use engine::{
    DEFAULT_TABLE, EXTRACT_SCHEMA, ExtractColumn, ExtractEngine, ExtractReader, Row, TableName,
    quote_identifier, quote_literal, select_table,
};
pub use extractor::{ExtractFileExtractor, HYPER_EXTENSION, ScannedTable};
pub use server::{HyperConnection, HyperServer};

#[cfg(test)]
pub(crate) use extractor::tests::{MockEngine, cell};
