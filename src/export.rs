//! Packaged extract to object store conversion
//!
//! Given a downloaded `.tdsx`, unpack it, scan every `.hyper` file, write each
//! converted table as delimited text with a JSON column sidecar, and publish
//! both under the remote root.

use crate::config::Config;
use crate::etl::{Extractor, Transformer};
use crate::hyper::{ExtractEngine, ExtractFileExtractor};
use crate::storage::{
    DelimitedWriter, ObjectStorage, PathLayout, ensure_dir, file_uri, reset_dir, sidecar_name,
    unpack,
};
use crate::transform::{ColumnDescriptor, DelimitedTable, TableFormatter};

use eyre::{Context, Result, eyre};
use owo_colors::OwoColorize;
use std::path::Path;

/// Result of converting one data source
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    /// Remote URI of the last delimited file uploaded
    pub remote_uri: String,
    /// Remote URI of its column sidecar
    pub sidecar_uri: String,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: usize,
}

/// One conversion of a packaged extract
pub struct Conversion<'a, E> {
    layout: PathLayout,
    engine: E,
    storage: &'a ObjectStorage,
    table_name: Option<String>,
    compress: bool,
}

impl<'a, E: ExtractEngine> Conversion<'a, E> {
    pub fn new(layout: PathLayout, engine: E, storage: &'a ObjectStorage) -> Self {
        Self {
            layout,
            engine,
            storage,
            table_name: None,
            compress: false,
        }
    }

    /// Conversion for `filename` using the config's staging root, remote root,
    /// table choice, and compression setting
    pub fn from_config(
        config: &Config,
        filename: &str,
        engine: E,
        storage: &'a ObjectStorage,
    ) -> Result<Self> {
        let root = std::path::absolute(&config.outpath)
            .with_context(|| format!("Invalid TdsxOutpath: {}", config.outpath.display()))?;
        let layout = PathLayout::new(root, config.location_uri.clone(), filename);
        Ok(Self::new(layout, engine, storage)
            .with_table_name(config.table_name.clone())
            .with_compression(config.compress))
    }

    pub fn with_table_name(mut self, table_name: Option<String>) -> Self {
        self.table_name = table_name;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn layout(&self) -> &PathLayout {
        &self.layout
    }

    /// Create the staging directories
    pub fn prepare(&self) -> Result<()> {
        ensure_dir(self.layout.download_dir())?;
        ensure_dir(self.layout.extracted_dir())?;
        ensure_dir(self.layout.processed_dir())?;
        Ok(())
    }

    /// Convert the packaged extract at `package`
    ///
    /// # Errors
    /// Fails on the first unpack, read, write, or upload error, and when the
    /// package holds no `.hyper` file
    pub async fn run(self, package: &Path) -> Result<ConversionOutput> {
        self.prepare()?;

        // Stale extract files from an earlier run must not be converted again
        let extracted_dir = self.layout.extracted_dir();
        reset_dir(&extracted_dir)?;
        unpack(package, &extracted_dir)?;

        let extractor = ExtractFileExtractor::new(self.engine, self.layout.extracts_dir())
            .with_table_name(self.table_name);
        let scanned = extractor.extract().await?;
        let tables = TableFormatter.transform_many(scanned)?;

        let writer = DelimitedWriter::new(self.layout.processed_dir())
            .with_compression(self.compress);

        // Several extracts each get their own sidecar
        let shared = tables.len() == 1;
        let mut output = None;
        for table in tables {
            let local = writer.write(&table)?;
            let sidecar = sidecar_name(&table.file_name, shared);
            output = Some(
                publish(&self.layout, self.storage, &local, &sidecar, table).await?,
            );
        }

        output.ok_or_else(|| eyre!("No tables converted from {}", package.display()))
    }
}

/// Write the sidecar locally, then upload the delimited file and the sidecar
async fn publish(
    layout: &PathLayout,
    storage: &ObjectStorage,
    local: &Path,
    sidecar: &str,
    table: DelimitedTable,
) -> Result<ConversionOutput> {
    let descriptors = serde_json::to_vec(&table.columns)
        .with_context(|| "Failed to serialize column descriptors")?;
    let sidecar_local = file_uri(layout.sidecar_path(sidecar))?;
    storage.put_file(&sidecar_local, descriptors).await?;

    let remote_uri = layout.remote_uri(local)?;
    storage.copy_file(&file_uri(local)?, &remote_uri).await?;

    let sidecar_uri = layout.remote_sidecar_uri(&remote_uri, sidecar);
    storage.copy_file(&sidecar_local, &sidecar_uri).await?;

    log::info!(
        "Published {} ({} rows) to {}",
        table.file_name.cyan(),
        table.rows.len(),
        remote_uri.bright_blue()
    );

    Ok(ConversionOutput {
        remote_uri,
        sidecar_uri,
        columns: table.columns,
        rows: table.rows.len(),
    })
}
