//! Object storage access by URI
//!
//! `file://` and `s3://` URIs resolve to an [`ObjectStore`] per call. S3
//! credentials come from the standard `AWS_*` environment variables.

use eyre::{Context, Result, eyre};
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use url::Url;

const AWS_ENV_PREFIX: &str = "AWS_";

/// Reads and writes files addressed by URI
#[derive(Clone)]
pub struct ObjectStorage {
    options: Vec<(String, String)>,
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.options.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("ObjectStorage")
            .field("options", &keys)
            .finish()
    }
}

impl ObjectStorage {
    /// Storage with only the region set
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            options: vec![("aws_region".to_string(), region.into())],
        }
    }

    /// Storage configured from `AWS_*` environment variables, with `region`
    /// overriding any region they set
    pub fn from_env(region: impl Into<String>) -> Self {
        let mut options: Vec<(String, String)> = std::env::vars()
            .filter(|(key, _)| key.starts_with(AWS_ENV_PREFIX))
            .map(|(key, value)| (key.to_lowercase(), value))
            .filter(|(key, _)| key != "aws_region" && key != "aws_default_region")
            .collect();
        options.push(("aws_region".to_string(), region.into()));
        Self { options }
    }

    fn resolve(&self, uri: &str) -> Result<(Arc<dyn ObjectStore>, ObjectPath)> {
        let url = Url::parse(uri).with_context(|| format!("Invalid storage URI: {}", uri))?;
        let (store, path) = object_store::parse_url_opts(&url, self.options.iter().cloned())
            .with_context(|| format!("Unsupported storage URI: {}", uri))?;
        Ok((Arc::from(store), path))
    }

    /// Write `bytes` to `uri`, replacing any existing object
    pub async fn put_file(&self, uri: &str, bytes: Vec<u8>) -> Result<()> {
        let (store, path) = self.resolve(uri)?;
        let size = bytes.len();
        store
            .put(&path, PutPayload::from(bytes))
            .await
            .with_context(|| format!("Failed to write {}", uri))?;
        log::debug!("Wrote {} byte(s) to {}", size, uri);
        Ok(())
    }

    /// Copy the object at `src_uri` to `dst_uri`.
    ///
    /// Local sources are streamed; other sources are read into memory first.
    pub async fn copy_file(&self, src_uri: &str, dst_uri: &str) -> Result<()> {
        let (store, path) = self.resolve(dst_uri)?;

        if let Some(local) = local_path(src_uri)? {
            let mut source = tokio::fs::File::open(&local)
                .await
                .with_context(|| format!("Failed to open {}", local.display()))?;
            let mut writer = BufWriter::new(store, path);
            tokio::io::copy(&mut source, &mut writer)
                .await
                .with_context(|| format!("Failed to upload {} to {}", src_uri, dst_uri))?;
            writer
                .shutdown()
                .await
                .with_context(|| format!("Failed to complete upload to {}", dst_uri))?;
        } else {
            let (src_store, src_path) = self.resolve(src_uri)?;
            let bytes = src_store
                .get(&src_path)
                .await
                .with_context(|| format!("Failed to read {}", src_uri))?
                .bytes()
                .await
                .with_context(|| format!("Failed to read {}", src_uri))?;
            store
                .put(&path, PutPayload::from(bytes))
                .await
                .with_context(|| format!("Failed to write {}", dst_uri))?;
        }

        log::info!("Uploaded {} to {}", src_uri, dst_uri);
        Ok(())
    }
}

/// `file://` URI for an absolute local path
pub fn file_uri(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|_| eyre!("Not an absolute path: {}", path.display()))
}

fn local_path(uri: &str) -> Result<Option<std::path::PathBuf>> {
    let url = Url::parse(uri).with_context(|| format!("Invalid storage URI: {}", uri))?;
    if url.scheme() != "file" {
        return Ok(None);
    }
    url.to_file_path()
        .map(Some)
        .map_err(|_| eyre!("Invalid file URI: {}", uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("PROCESSED/A/D2022.Extract/tds_columns.json");
        let storage = ObjectStorage::new("us-east-1");

        storage
            .put_file(&file_uri(&target).unwrap(), b"[]".to_vec())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_put_file_overwrites() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out.json");
        let uri = file_uri(&target).unwrap();
        let storage = ObjectStorage::new("us-east-1");

        storage.put_file(&uri, b"first".to_vec()).await.unwrap();
        storage.put_file(&uri, b"second".to_vec()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_copy_local_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Extract.csv");
        std::fs::write(&source, "a\tb\n1\t2\n").unwrap();
        let target = temp.path().join("remote/PROCESSED/Extract.csv");
        let storage = ObjectStorage::new("us-east-1");

        storage
            .copy_file(&file_uri(&source).unwrap(), &file_uri(&target).unwrap())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "a\tb\n1\t2\n");
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let temp = TempDir::new().unwrap();
        let storage = ObjectStorage::new("us-east-1");
        let result = storage
            .copy_file(
                &file_uri(temp.path().join("missing.csv")).unwrap(),
                &file_uri(temp.path().join("out.csv")).unwrap(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_uri() {
        let storage = ObjectStorage::new("us-east-1");
        let err = storage.put_file("not a uri", vec![]).await.unwrap_err();
        assert!(err.to_string().contains("Invalid storage URI"));
    }

    #[test]
    fn test_file_uri_requires_absolute_path() {
        assert!(file_uri("relative/path").is_err());
        assert!(file_uri("/tmp/x").unwrap().starts_with("file:///tmp/x"));
    }

    #[test]
    fn test_debug_hides_values() {
        let storage = ObjectStorage::new("us-gov-west-1");
        let debug = format!("{:?}", storage);
        assert!(debug.contains("aws_region"));
        assert!(!debug.contains("us-gov-west-1"));
    }
}
