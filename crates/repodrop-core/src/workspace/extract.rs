//! Zip extraction into a workspace.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use crate::error::DeployError;

/// What an extraction produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    /// Entries skipped because their path escapes the destination
    pub skipped: usize,
}

/// Extract every entry of the zip archive at `archive` into `dest`.
///
/// Existing files are overwritten. Any failure to read the archive or write
/// an entry is reported as [`DeployError::ArchiveCorrupt`].
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<ExtractSummary, DeployError> {
    let corrupt = |msg: String| DeployError::ArchiveCorrupt(msg);

    let file = File::open(archive)
        .map_err(|e| corrupt(format!("failed to open {}: {}", archive.display(), e)))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| corrupt(format!("failed to read zip archive: {}", e)))?;

    std::fs::create_dir_all(dest).map_err(|e| {
        corrupt(format!(
            "failed to create extract directory {}: {}",
            dest.display(),
            e
        ))
    })?;

    let mut summary = ExtractSummary::default();
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| corrupt(format!("failed to read zip entry {}: {}", i, e)))?;

        let outpath = match entry.enclosed_name() {
            Some(path) => dest.join(path),
            None => {
                tracing::warn!("Skipping zip entry with unsafe path: {}", entry.name());
                summary.skipped += 1;
                continue;
            }
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|e| {
                corrupt(format!(
                    "failed to create directory {}: {}",
                    outpath.display(),
                    e
                ))
            })?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                corrupt(format!(
                    "failed to create parent directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut outfile = File::create(&outpath)
            .map_err(|e| corrupt(format!("failed to create {}: {}", outpath.display(), e)))?;
        io::copy(&mut entry, &mut outfile)
            .map_err(|e| corrupt(format!("failed to extract {}: {}", entry.name(), e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }

        summary.files += 1;
    }

    tracing::debug!(
        "Extracted {} files and {} directories into {}",
        summary.files,
        summary.directories,
        dest.display()
    );
    Ok(summary)
}
