//! Job configuration
//!
//! All settings are read once from the process environment (optionally seeded
//! from a `.env` file) into a [`Config`] that is passed explicitly to every
//! operation.

use eyre::{Context, Result};
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_REGION: &str = "us-gov-west-1";
pub const DEFAULT_OUTPATH: &str = "/tmp/tdsx/";
pub const DEFAULT_LOCATION_URI: &str = "s3://wc2h-dtl-prd-transient/TDSX/";
pub const DEFAULT_HYPER_ENDPOINT: &str = "postgres://tableau_internal_user@localhost:7483";

/// Settings for one export run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Region handed to the object store (`AWS_DEFAULT_REGION`)
    pub region: String,
    /// Local staging root (`TdsxOutpath`)
    pub outpath: PathBuf,
    /// Remote root that processed files are published under (`GlueLocationUri`)
    pub location_uri: String,
    /// Secret name of the personal access token blob (`TableauAuthTokenName`)
    pub token_name: String,
    /// Tableau site content URL (`TableauSiteName`)
    pub site_name: String,
    /// Tableau server base URL (`TableauServerUrl`)
    pub server_url: Url,
    /// Connection string of a running Hyper server (`HyperEndpoint`)
    pub hyper_endpoint: String,
    /// Table to convert when an extract holds more than one (`HyperTableName`)
    pub table_name: Option<String>,
    /// Gzip the delimited output (`TdsxCompress`)
    pub compress: bool,
}

impl Config {
    /// Build a config with defaults for everything but the three required Tableau settings
    pub fn new(server_url: Url, site_name: impl Into<String>, token_name: impl Into<String>) -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            outpath: PathBuf::from(DEFAULT_OUTPATH),
            location_uri: DEFAULT_LOCATION_URI.to_string(),
            token_name: token_name.into(),
            site_name: site_name.into(),
            server_url,
            hyper_endpoint: DEFAULT_HYPER_ENDPOINT.to_string(),
            table_name: None,
            compress: false,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Required:
    /// - TableauAuthTokenName
    /// - TableauSiteName
    /// - TableauServerUrl
    ///
    /// Optional (with defaults):
    /// - AWS_DEFAULT_REGION (us-gov-west-1)
    /// - TdsxOutpath (/tmp/tdsx/)
    /// - GlueLocationUri (s3://wc2h-dtl-prd-transient/TDSX/)
    /// - HyperEndpoint (postgres://tableau_internal_user@localhost:7483)
    /// - HyperTableName (unset)
    /// - TdsxCompress (false)
    pub fn from_env() -> Result<Self> {
        let token_name = std::env::var("TableauAuthTokenName")
            .context("TableauAuthTokenName environment variable not set")?;
        let site_name = std::env::var("TableauSiteName")
            .context("TableauSiteName environment variable not set")?;
        let url_str = std::env::var("TableauServerUrl")
            .context("TableauServerUrl environment variable not set")?;
        let server_url = Url::parse(&url_str)
            .with_context(|| format!("Invalid TableauServerUrl: {}", url_str))?;

        let mut config = Self::new(server_url, site_name, token_name);

        if let Ok(region) = std::env::var("AWS_DEFAULT_REGION") {
            config.region = region;
        }
        if let Ok(outpath) = std::env::var("TdsxOutpath") {
            config.outpath = PathBuf::from(outpath);
        }
        if let Ok(location_uri) = std::env::var("GlueLocationUri") {
            config.location_uri = location_uri;
        }
        if let Ok(endpoint) = std::env::var("HyperEndpoint") {
            config.hyper_endpoint = endpoint;
        }
        config.table_name = std::env::var("HyperTableName")
            .ok()
            .filter(|name| !name.trim().is_empty());
        if let Ok(compress) = std::env::var("TdsxCompress") {
            config.compress = parse_flag(&compress)
                .with_context(|| format!("Invalid TdsxCompress: {}", compress))?;
        }

        Ok(config)
    }

    pub fn with_outpath(mut self, outpath: impl AsRef<Path>) -> Self {
        self.outpath = outpath.as_ref().to_path_buf();
        self
    }

    pub fn with_location_uri(mut self, location_uri: impl Into<String>) -> Self {
        self.location_uri = location_uri.into();
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => eyre::bail!("expected a boolean, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "AWS_DEFAULT_REGION",
        "TdsxOutpath",
        "GlueLocationUri",
        "TableauAuthTokenName",
        "TableauSiteName",
        "TableauServerUrl",
        "HyperEndpoint",
        "HyperTableName",
        "TdsxCompress",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_required() {
        unsafe {
            std::env::set_var("TableauAuthTokenName", "dtl-prd-tableau");
            std::env::set_var("TableauSiteName", "FiscalService");
            std::env::set_var("TableauServerUrl", "https://tableau.example.com/");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        set_required();

        let config = Config::from_env().unwrap();
        assert_eq!(config.region, "us-gov-west-1");
        assert_eq!(config.outpath, PathBuf::from("/tmp/tdsx/"));
        assert_eq!(config.location_uri, "s3://wc2h-dtl-prd-transient/TDSX/");
        assert_eq!(config.token_name, "dtl-prd-tableau");
        assert_eq!(config.site_name, "FiscalService");
        assert_eq!(config.server_url.as_str(), "https://tableau.example.com/");
        assert_eq!(config.table_name, None);
        assert!(!config.compress);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        set_required();
        unsafe {
            std::env::set_var("AWS_DEFAULT_REGION", "us-east-1");
            std::env::set_var("TdsxOutpath", "/data/tdsx/");
            std::env::set_var("GlueLocationUri", "file:///srv/out/");
            std::env::set_var("HyperTableName", "Orders");
            std::env::set_var("TdsxCompress", "yes");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.outpath, PathBuf::from("/data/tdsx/"));
        assert_eq!(config.location_uri, "file:///srv/out/");
        assert_eq!(config.table_name.as_deref(), Some("Orders"));
        assert!(config.compress);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_required() {
        clear_env();
        let result = Config::from_env();
        assert!(result.is_err());
        assert!(
            format!("{:#}", result.unwrap_err()).contains("TableauAuthTokenName")
        );
    }

    #[test]
    #[serial]
    fn test_invalid_flag() {
        clear_env();
        set_required();
        unsafe { std::env::set_var("TdsxCompress", "maybe") };
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
