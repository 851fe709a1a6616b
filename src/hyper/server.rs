//! Hyper server backend
//!
//! Hyper speaks the PostgreSQL wire protocol. Each extract file is opened as
//! the connection's database on a running Hyper server, and every statement
//! runs over the simple query protocol so values arrive as text.

use super::engine::{
    ExtractColumn, ExtractEngine, ExtractReader, Row, TableName, quote_literal,
};

use eyre::{Context, Result, eyre};
use sqlx::Row as _;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use std::path::Path;
use std::str::FromStr;

/// Hyper server reachable at a `postgres://` endpoint
#[derive(Debug, Clone)]
pub struct HyperServer {
    options: PgConnectOptions,
}

impl HyperServer {
    /// # Errors
    /// Returns an error if `endpoint` is not a valid connection string
    pub fn new(endpoint: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(endpoint)
            .with_context(|| format!("Invalid Hyper endpoint: {}", endpoint))?;
        Ok(Self { options })
    }
}

impl ExtractEngine for HyperServer {
    type Reader = HyperConnection;

    async fn open(&self, path: &Path) -> Result<HyperConnection> {
        let database = path
            .to_str()
            .ok_or_else(|| eyre!("Extract path is not valid UTF-8: {}", path.display()))?;

        log::debug!("Opening extract {}", path.display());
        let options = self.options.clone().database(database);
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open extract {}", path.display()))?;

        Ok(HyperConnection { pool })
    }
}

/// Connection to one extract file on a Hyper server
///
/// Backed by a single-connection pool: `&PgPool` is an executor for any
/// borrow, which keeps the reader futures `Send`.
pub struct HyperConnection {
    pool: PgPool,
}

impl HyperConnection {
    async fn query(&self, sql: &str) -> Result<Vec<PgRow>> {
        log::trace!("{}", sql);
        sqlx::raw_sql(sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Query failed: {}", sql))
    }
}

impl ExtractReader for HyperConnection {
    async fn table_names(&mut self, schema: &str) -> Result<Vec<TableName>> {
        let sql = format!(
            "SELECT tablename FROM pg_catalog.pg_tables WHERE schemaname = {} ORDER BY tablename",
            quote_literal(schema)
        );
        let rows = self.query(&sql).await?;

        rows.iter()
            .map(|row| -> Result<TableName> {
                Ok(TableName::new(schema, text(row, 0)?.unwrap_or_default()))
            })
            .collect()
    }

    async fn columns(&mut self, table: &TableName) -> Result<Vec<ExtractColumn>> {
        let sql = format!(
            "SELECT a.attname, pg_catalog.format_type(a.atttypid, a.atttypmod) \
             FROM pg_catalog.pg_attribute a \
             JOIN pg_catalog.pg_class c ON a.attrelid = c.oid \
             JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid \
             WHERE n.nspname = {} AND c.relname = {} AND a.attnum > 0 \
             ORDER BY a.attnum",
            quote_literal(&table.schema),
            quote_literal(&table.name)
        );
        let rows = self.query(&sql).await?;

        rows.iter()
            .map(|row| -> Result<ExtractColumn> {
                Ok(ExtractColumn::new(
                    text(row, 0)?.unwrap_or_default(),
                    text(row, 1)?.unwrap_or_default(),
                ))
            })
            .collect()
    }

    async fn scan(&mut self, table: &TableName) -> Result<Vec<Row>> {
        let rows = self
            .query(&format!("SELECT * FROM {}", table.quoted()))
            .await?;

        rows.iter()
            .map(|row| (0..row.len()).map(|i| text(row, i)).collect::<Result<Row>>())
            .collect()
    }

    async fn close(self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Text value of a cell; the simple query protocol returns every type as text
fn text(row: &PgRow, index: usize) -> Result<Option<String>> {
    row.try_get_unchecked::<Option<String>, _>(index)
        .with_context(|| format!("Failed to read column {}", index))
}
