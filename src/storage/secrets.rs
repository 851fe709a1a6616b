//! Secret lookup by name

use eyre::{Context, Result};
use std::future::Future;

const FILE_PREFIX: &str = "file://";

/// Source of named secret values
pub trait SecretSource: Send + Sync {
    fn get_secret(&self, name: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Secrets from the process environment or local files.
///
/// `file://<path>` names read the file; any other name reads the environment
/// variable of that name.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    async fn get_secret(&self, name: &str) -> Result<String> {
        let value = match name.strip_prefix(FILE_PREFIX) {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read secret file {}", path))?,
            None => std::env::var(name)
                .with_context(|| format!("Secret {} not found in environment", name))?,
        };
        log::debug!("Resolved secret {}", name);
        Ok(value.trim().to_string())
    }
}
