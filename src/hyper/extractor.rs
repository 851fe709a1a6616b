//! Extract file extractor
//!
//! Scans every `.hyper` file in an unpacked data source's extracts directory.

use super::engine::{
    EXTRACT_SCHEMA, ExtractColumn, ExtractEngine, ExtractReader, Row, TableName, select_table,
};
use crate::etl::Extractor;

use eyre::{Context, Result};
use std::path::{Path, PathBuf};

/// File extension of columnar extract files
pub const HYPER_EXTENSION: &str = "hyper";

/// Contents of the converted table of one extract file
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedTable {
    /// File name of the extract, e.g. `Extract.hyper`
    pub file_name: String,
    pub table: TableName,
    pub columns: Vec<ExtractColumn>,
    pub rows: Vec<Row>,
}

/// Extractor yielding one [`ScannedTable`] per extract file, in file-name order
pub struct ExtractFileExtractor<E> {
    engine: E,
    dir: PathBuf,
    table_name: Option<String>,
}

impl<E: ExtractEngine> ExtractFileExtractor<E> {
    /// # Arguments
    /// * `engine` - Engine used to open each extract file
    /// * `dir` - Directory holding the `.hyper` files
    pub fn new(engine: E, dir: impl AsRef<Path>) -> Self {
        Self {
            engine,
            dir: dir.as_ref().to_path_buf(),
            table_name: None,
        }
    }

    /// Convert this table instead of the default choice
    pub fn with_table_name(mut self, table_name: Option<String>) -> Self {
        self.table_name = table_name;
        self
    }

    /// Extract files in the directory, sorted by name
    pub fn extract_files(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read extracts directory {}", self.dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|s| s.to_str()) == Some(HYPER_EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }

    /// Open one extract file and read its selected table
    pub async fn scan_file(&self, path: &Path) -> Result<ScannedTable> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("Reading extract {}", file_name);

        let mut reader = self.engine.open(path).await?;
        let scanned = read_table(&mut reader, self.table_name.as_deref()).await;
        let closed = reader.close().await;

        let (table, columns, rows) = scanned
            .with_context(|| format!("Failed to read extract {}", path.display()))?;
        closed?;

        Ok(ScannedTable {
            file_name,
            table,
            columns,
            rows,
        })
    }
}

async fn read_table<R: ExtractReader>(
    reader: &mut R,
    requested: Option<&str>,
) -> Result<(TableName, Vec<ExtractColumn>, Vec<Row>)> {
    let tables = reader.table_names(EXTRACT_SCHEMA).await?;
    log::debug!(
        "Tables in schema '{}': {}",
        EXTRACT_SCHEMA,
        tables
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let table = select_table(&tables, requested)?;
    let columns = reader.columns(&table).await?;
    for column in &columns {
        log::debug!("Column {} has type={}", column.name, column.type_name);
    }

    let rows = reader.scan(&table).await?;
    log::info!(
        "Scanned {} row(s) x {} column(s) from {}",
        rows.len(),
        columns.len(),
        table
    );

    Ok((table, columns, rows))
}

impl<E: ExtractEngine> Extractor for ExtractFileExtractor<E> {
    type Item = ScannedTable;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let files = self.extract_files()?;
        if files.is_empty() {
            eyre::bail!("No .{} files found in {}", HYPER_EXTENSION, self.dir.display());
        }

        let mut tables = Vec::with_capacity(files.len());
        for file in &files {
            tables.push(self.scan_file(file).await?);
        }

        log::info!("Extracted {} table(s)", tables.len());

        Ok(tables)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Engine serving canned tables keyed by extract file name
    #[derive(Clone, Default)]
    pub(crate) struct MockEngine {
        pub files: HashMap<String, Vec<(String, Vec<ExtractColumn>, Vec<Row>)>>,
        pub closed: Arc<Mutex<usize>>,
    }

    impl MockEngine {
        pub fn with_table(
            mut self,
            file: &str,
            table: &str,
            columns: Vec<ExtractColumn>,
            rows: Vec<Row>,
        ) -> Self {
            self.files
                .entry(file.to_string())
                .or_default()
                .push((table.to_string(), columns, rows));
            self
        }
    }

    pub(crate) struct MockReader {
        tables: Vec<(String, Vec<ExtractColumn>, Vec<Row>)>,
        closed: Arc<Mutex<usize>>,
    }

    impl MockReader {
        fn find(&self, table: &TableName) -> Result<&(String, Vec<ExtractColumn>, Vec<Row>)> {
            self.tables
                .iter()
                .find(|(name, _, _)| *name == table.name)
                .ok_or_else(|| eyre::eyre!("no such table {}", table))
        }
    }

    impl ExtractReader for MockReader {
        async fn table_names(&mut self, schema: &str) -> Result<Vec<TableName>> {
            Ok(self
                .tables
                .iter()
                .map(|(name, _, _)| TableName::new(schema, name.clone()))
                .collect())
        }

        async fn columns(&mut self, table: &TableName) -> Result<Vec<ExtractColumn>> {
            Ok(self.find(table)?.1.clone())
        }

        async fn scan(&mut self, table: &TableName) -> Result<Vec<Row>> {
            Ok(self.find(table)?.2.clone())
        }

        async fn close(self) -> Result<()> {
            *self.closed.lock().unwrap() += 1;
            Ok(())
        }
    }

    impl ExtractEngine for MockEngine {
        type Reader = MockReader;

        async fn open(&self, path: &Path) -> Result<MockReader> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let tables = self
                .files
                .get(&name)
                .cloned()
                .ok_or_else(|| eyre::eyre!("cannot open {}", name))?;
            Ok(MockReader {
                tables,
                closed: self.closed.clone(),
            })
        }
    }

    pub(crate) fn cell(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[tokio::test]
    async fn test_extract_single_file() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "Extract.hyper");
        touch(temp.path(), "notes.txt");

        let engine = MockEngine::default().with_table(
            "Extract.hyper",
            "Extract",
            vec![ExtractColumn::new("Region", "text")],
            vec![vec![cell("East")], vec![None]],
        );
        let closed = engine.closed.clone();

        let extractor = ExtractFileExtractor::new(engine, temp.path());
        let tables = extractor.extract().await.unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].file_name, "Extract.hyper");
        assert_eq!(tables[0].table, TableName::new("Extract", "Extract"));
        assert_eq!(tables[0].rows, vec![vec![cell("East")], vec![None]]);
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_extract_files_sorted() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b.hyper");
        touch(temp.path(), "a.hyper");

        let engine = MockEngine::default()
            .with_table("a.hyper", "Extract", vec![], vec![])
            .with_table("b.hyper", "Extract", vec![], vec![]);
        let extractor = ExtractFileExtractor::new(engine, temp.path());

        let names: Vec<String> = extractor
            .extract()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.file_name)
            .collect();
        assert_eq!(names, vec!["a.hyper", "b.hyper"]);
    }

    #[tokio::test]
    async fn test_requested_table() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "Extract.hyper");

        let engine = MockEngine::default()
            .with_table("Extract.hyper", "Extract", vec![], vec![])
            .with_table(
                "Extract.hyper",
                "Orders",
                vec![ExtractColumn::new("Id", "bigint")],
                vec![vec![cell("1")]],
            );
        let extractor = ExtractFileExtractor::new(engine, temp.path())
            .with_table_name(Some("Orders".to_string()));

        let tables = extractor.extract().await.unwrap();
        assert_eq!(tables[0].table.name, "Orders");
        assert_eq!(tables[0].rows.len(), 1);
    }

    #[tokio::test]
    async fn test_connection_closed_on_failure() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "Extract.hyper");

        let engine = MockEngine::default()
            .with_table("Extract.hyper", "Orders", vec![], vec![])
            .with_table("Extract.hyper", "Returns", vec![], vec![]);
        let closed = engine.closed.clone();
        let extractor = ExtractFileExtractor::new(engine, temp.path());

        assert!(extractor.extract().await.is_err());
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_extract_files() {
        let temp = TempDir::new().unwrap();
        let extractor = ExtractFileExtractor::new(MockEngine::default(), temp.path());
        let err = extractor.extract().await.unwrap_err();
        assert!(err.to_string().contains("No .hyper files"));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let extractor =
            ExtractFileExtractor::new(MockEngine::default(), temp.path().join("Data/Extracts"));
        assert!(extractor.extract().await.is_err());
    }
}
