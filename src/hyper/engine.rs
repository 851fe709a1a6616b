//! Extract engine abstraction
//!
//! An [`ExtractEngine`] opens `.hyper` extract files; the resulting
//! [`ExtractReader`] enumerates tables and columns and scans rows.

use eyre::Result;
use std::future::Future;
use std::path::Path;

/// Schema that Tableau writes extract tables into
pub const EXTRACT_SCHEMA: &str = "Extract";

/// Table that Tableau names after its schema in single-table extracts
pub const DEFAULT_TABLE: &str = "Extract";

/// One scanned row; `None` is SQL NULL
pub type Row = Vec<Option<String>>;

/// Schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub schema: String,
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// SQL form with both parts quoted, e.g. `"Extract"."Extract"`
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_identifier(&self.schema), quote_identifier(&self.name))
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.quoted())
    }
}

/// Column metadata as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractColumn {
    pub name: String,
    /// Engine type name, e.g. `text` or `numeric(18,2)`
    pub type_name: String,
}

impl ExtractColumn {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Open connection to one extract file
pub trait ExtractReader: Send {
    /// Tables in `schema`, in catalog order
    fn table_names(&mut self, schema: &str) -> impl Future<Output = Result<Vec<TableName>>> + Send;

    /// Columns of `table`, in ordinal order
    fn columns(&mut self, table: &TableName)
    -> impl Future<Output = Result<Vec<ExtractColumn>>> + Send;

    /// Every row of `table`, materialized in memory
    fn scan(&mut self, table: &TableName) -> impl Future<Output = Result<Vec<Row>>> + Send;

    /// Release the connection
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens extract files
pub trait ExtractEngine: Send + Sync {
    type Reader: ExtractReader;

    fn open(&self, path: &Path) -> impl Future<Output = Result<Self::Reader>> + Send;
}

/// Choose which table of an extract to convert.
///
/// Order of preference: the explicitly requested table, the table named
/// `Extract`, the only table. Anything else is an error naming the candidates.
pub fn select_table(tables: &[TableName], requested: Option<&str>) -> Result<TableName> {
    let candidates = || {
        tables
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    if let Some(requested) = requested {
        return tables
            .iter()
            .find(|t| t.name == requested)
            .cloned()
            .ok_or_else(|| {
                eyre::eyre!(
                    "Table '{}' not found in extract. Available tables: {}",
                    requested,
                    candidates()
                )
            });
    }

    if let Some(table) = tables.iter().find(|t| t.name == DEFAULT_TABLE) {
        return Ok(table.clone());
    }

    match tables {
        [] => eyre::bail!("Extract has no tables in schema '{}'", EXTRACT_SCHEMA),
        [only] => Ok(only.clone()),
        _ => eyre::bail!(
            "Extract holds several tables, choose one with HyperTableName: {}",
            candidates()
        ),
    }
}

/// Double-quote an SQL identifier
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Single-quote an SQL string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
