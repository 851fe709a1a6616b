//! Packaged extract (`.tdsx`) unpacking

use eyre::{Context, Result};
use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

/// Unpack a packaged extract into `dest`, returning the archive entry names
pub fn unpack(archive_path: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<Vec<String>> {
    let archive_path = archive_path.as_ref();
    let dest = dest.as_ref();

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Not a packaged extract: {}", archive_path.display()))?;

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        log::debug!("{:>12} {}", entry.size(), entry.name());
        names.push(entry.name().to_string());
    }

    archive
        .extract(dest)
        .with_context(|| format!("Failed to unpack {} to {}", archive_path.display(), dest.display()))?;

    log::info!(
        "Unpacked {} entr{} to {}",
        names.len(),
        if names.len() == 1 { "y" } else { "ies" },
        dest.display()
    );

    Ok(names)
}
