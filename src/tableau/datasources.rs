//! Data sources API
//!
//! Lists published data sources via GET /api/{version}/sites/{site-id}/datasources
//! and downloads packaged extracts via GET .../datasources/{id}/content

use super::pagination::{Named, Page, PageRequest, PageSource, Pagination};
use crate::client::Session;

use eyre::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Extension used when neither the target path nor the server names one
pub const DEFAULT_PACKAGE_EXTENSION: &str = "tdsx";

/// Project a data source is published in
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A published data source
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub has_extracts: Option<bool>,
}

impl DataSource {
    /// Name of the containing project, if the listing included it
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }
}

impl Named for DataSource {
    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.id)
    }
}

#[derive(Deserialize)]
struct DataSourcesResponse {
    pagination: Pagination,
    #[serde(default)]
    datasources: DataSourceList,
}

#[derive(Default, Deserialize)]
struct DataSourceList {
    #[serde(default)]
    datasource: Vec<DataSource>,
}

/// Parse one page of the data sources listing
pub fn parse_datasources_page(body: &str) -> Result<Page<DataSource>> {
    let response: DataSourcesResponse =
        serde_json::from_str(body).with_context(|| "Failed to parse data sources response")?;
    Ok(Page {
        items: response.datasources.datasource,
        pagination: response.pagination,
    })
}

/// Paged listing of the published data sources of the signed-in site
pub struct DataSourceListing<'a> {
    session: &'a Session,
}

impl<'a> DataSourceListing<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }
}

impl PageSource for DataSourceListing<'_> {
    type Item = DataSource;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<DataSource>> {
        log::debug!("Fetching data sources page {}", request.number);

        let response = self
            .session
            .get_with_query("datasources", &request.query())
            .await
            .with_context(|| "Failed to fetch data sources from Tableau")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Failed to fetch data sources ({}): {}", status, body);
        }

        let body = response
            .text()
            .await
            .with_context(|| "Failed to read data sources response")?;

        parse_datasources_page(&body)
    }
}

/// Download a data source with its extract to `dest`.
///
/// When `dest` has no extension, the one from the server's file name is
/// appended (`tdsx` if the server sends none). Returns the written path.
pub async fn download_datasource(
    session: &Session,
    datasource_id: &str,
    dest: impl AsRef<Path>,
) -> Result<PathBuf> {
    let path = format!("datasources/{}/content", datasource_id);
    log::debug!("Downloading data source {}", datasource_id);

    let mut response = session
        .get_with_query(&path, &[("includeExtract", "true".to_string())])
        .await
        .with_context(|| format!("Failed to download data source '{}'", datasource_id))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        eyre::bail!(
            "Failed to download data source '{}' ({}): {}",
            datasource_id,
            status,
            body
        );
    }

    let disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let target = resolve_download_path(dest.as_ref(), disposition.as_deref());

    let mut file = tokio::fs::File::create(&target)
        .await
        .with_context(|| format!("Failed to create {}", target.display()))?;
    let mut written = 0usize;
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Failed to read data source '{}' content", datasource_id))?
    {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written += chunk.len();
    }
    file.flush().await?;

    log::info!(
        "Downloaded data source {} ({} bytes) to {}",
        datasource_id,
        written,
        target.display()
    );

    Ok(target)
}

/// Where a download lands given the requested path and `Content-Disposition`
pub fn resolve_download_path(dest: &Path, content_disposition: Option<&str>) -> PathBuf {
    if dest.extension().is_some() {
        return dest.to_path_buf();
    }

    let extension = content_disposition
        .and_then(disposition_filename)
        .and_then(|name| {
            Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_PACKAGE_EXTENSION.to_string());

    let mut name = dest.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// File name from a `Content-Disposition` header value
fn disposition_filename(header: &str) -> Option<String> {
    let pattern = Regex::new(r#"filename\*?\s*=\s*(?:UTF-8'')?"?([^";]+)"?"#).ok()?;
    pattern
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}
