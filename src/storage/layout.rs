//! Staging layout
//!
//! Every local and remote location used by one conversion is a function of
//! the staging root, the remote root, and the data source file name:
//!
//! ```text
//! <root>/downloaded/<file>
//! <root>/extracted/<file>/Data/Extracts/<hyperfile>
//! <root>/extracted/<file>/<sidecar>
//! <root>/processed/<UPPER(file[14..])>/D<file[..6]>.Extract/<hyperfile-as-csv>
//! <remote root>PROCESSED/<UPPER(file[14..])>/D<file[..6]>.Extract/<hyperfile-as-csv>
//! <remote root>PROCESSED/<UPPER(file[14..])>/D<file[..6]>.Extract/<sidecar>
//! ```
//!
//! The sidecar is `tds_columns.json` when the package holds one extract, and
//! `<hyperfile-stem>_tds_columns.json` per extract otherwise.

use eyre::{Result, eyre};
use std::path::{Component, Path, PathBuf};

pub const DOWNLOADED_DIR: &str = "downloaded";
pub const EXTRACTED_DIR: &str = "extracted";
pub const PROCESSED_DIR: &str = "processed";
pub const REMOTE_PROCESSED_DIR: &str = "PROCESSED";
pub const EXTRACTS_SUBDIR: &str = "Data/Extracts";
pub const SIDECAR_FILE: &str = "tds_columns.json";

/// Paths derived for one data source file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    root: PathBuf,
    location_uri: String,
    filename: String,
}

impl PathLayout {
    pub fn new(
        root: impl AsRef<Path>,
        location_uri: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let mut location_uri = location_uri.into();
        if !location_uri.ends_with('/') {
            location_uri.push('/');
        }
        Self {
            root: root.as_ref().to_path_buf(),
            location_uri,
            filename: filename.into(),
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root.join(DOWNLOADED_DIR)
    }

    /// Requested download target; the server may add an extension
    pub fn download_path(&self) -> PathBuf {
        self.download_dir().join(&self.filename)
    }

    /// Where the packaged extract is unpacked
    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join(EXTRACTED_DIR).join(&self.filename)
    }

    /// Directory holding the `.hyper` files inside the unpacked package
    pub fn extracts_dir(&self) -> PathBuf {
        self.extracted_dir().join(EXTRACTS_SUBDIR)
    }

    /// Local column metadata file named `sidecar`
    pub fn sidecar_path(&self, sidecar: &str) -> PathBuf {
        self.extracted_dir().join(sidecar)
    }

    pub fn processed_root(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR)
    }

    /// `processed/<UPPER(file[14..])>/D<file[..6]>.Extract`
    pub fn processed_dir(&self) -> PathBuf {
        let (subdir, extract_dir) = processed_names(&self.filename);
        self.processed_root().join(subdir).join(extract_dir)
    }

    /// Local path of a delimited output file
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.processed_dir().join(file_name)
    }

    /// Remote URI of a file under the processed root.
    ///
    /// # Errors
    /// Returns an error if `local` is not under the processed root
    pub fn remote_uri(&self, local: &Path) -> Result<String> {
        let processed_root = self.processed_root();
        let relative = local.strip_prefix(&processed_root).map_err(|_| {
            eyre!(
                "{} is not under {}",
                local.display(),
                processed_root.display()
            )
        })?;

        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Ok(format!(
            "{}{}/{}",
            self.location_uri,
            REMOTE_PROCESSED_DIR,
            parts.join("/")
        ))
    }

    /// Remote URI of the column metadata `sidecar` published next to
    /// `remote_output`
    pub fn remote_sidecar_uri(&self, remote_output: &str, sidecar: &str) -> String {
        match remote_output.rsplit_once('/') {
            Some((dir, _)) => format!("{}/{}", dir, sidecar),
            None => sidecar.to_string(),
        }
    }
}

/// Sidecar file name for the delimited file `output_file`.
///
/// `shared` is true when the package holds a single extract, which keeps the
/// plain `tds_columns.json` name.
pub fn sidecar_name(output_file: &str, shared: bool) -> String {
    if shared {
        return SIDECAR_FILE.to_string();
    }
    let stem = output_file.strip_suffix(".gz").unwrap_or(output_file);
    let stem = stem.strip_suffix(".csv").unwrap_or(stem);
    format!("{}_{}", stem, SIDECAR_FILE)
}

/// Directory names under `processed/` derived from the file name.
///
/// Character-based: names shorter than the slice bounds yield empty parts.
fn processed_names(filename: &str) -> (String, String) {
    let subdir: String = filename.chars().skip(14).collect::<String>().to_uppercase();
    let prefix: String = filename.chars().take(6).collect();
    (subdir, format!("D{}.Extract", prefix))
}
