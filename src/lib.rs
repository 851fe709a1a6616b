//! Tableau Data Source Exporter
//!
//! Downloads published Tableau data sources, converts their `.hyper` extracts
//! to tab-delimited text with a JSON column sidecar, and publishes both to
//! object storage.

pub mod cli;
pub mod client;
pub mod config;
pub mod etl;
pub mod export;
pub mod hyper;
pub mod storage;
pub mod tableau;
pub mod transform;

// Re-exports for convenience
pub use client::{PersonalAccessToken, Session, TableauClient};
pub use config::Config;
pub use etl::{Extractor, Transformer};
pub use export::{Conversion, ConversionOutput};
pub use hyper::{ExtractEngine, ExtractReader, HyperServer};
pub use storage::{DelimitedWriter, ObjectStorage, PathLayout, ensure_dir};
pub use tableau::{DataSource, Project, find_by_name};
pub use transform::{ColumnDescriptor, TableFormatter};
