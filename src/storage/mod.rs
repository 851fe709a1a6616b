//! Local staging and remote storage
//!
//! This module handles all file I/O of a conversion:
//! - Staging directories and path derivation
//! - Unpacking packaged extracts
//! - Writing delimited output
//! - Object storage uploads and secret lookup

mod delimited;
mod directory;
mod layout;
mod package;
mod remote;
mod secrets;

pub use delimited::DelimitedWriter;
pub use directory::{ensure_dir, reset_dir};
pub use layout::{
    DOWNLOADED_DIR, EXTRACTED_DIR, EXTRACTS_SUBDIR, PROCESSED_DIR, PathLayout,
    REMOTE_PROCESSED_DIR, SIDECAR_FILE, sidecar_name,
};
pub use package::unpack;
pub use remote::{ObjectStorage, file_uri};
pub use secrets::{EnvSecrets, SecretSource};
