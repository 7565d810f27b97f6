//! Received archive files.
//!
//! The submission interface stores an incoming archive in the upload
//! directory; from then on the file belongs to the deployment and is deleted
//! when it finishes.

use std::path::{Path, PathBuf};

use anyhow::Context;

/// Copy `source` into `upload_dir` under a unique name and return the copy.
///
/// The caller's own file is never touched by the pipeline. Each call claims
/// a fresh file name, so concurrent intakes never share a target.
pub fn receive_archive(source: &Path, upload_dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(upload_dir)
        .with_context(|| format!("Failed to create upload directory: {}", upload_dir.display()))?;

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    let stamp = chrono::Utc::now().timestamp_millis();

    let mut reader = std::fs::File::open(source)
        .with_context(|| format!("Failed to open archive {}", source.display()))?;

    for attempt in 0..100 {
        let candidate = upload_dir.join(format!("{}_{}_{}.zip", stamp, attempt, stem));
        let mut target = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to create upload file {}", candidate.display())
                });
            }
        };

        // The name is claimed; drop the partial copy if writing fails.
        let mut claimed = UploadedArchive::adopt(&candidate);
        std::io::copy(&mut reader, &mut target).with_context(|| {
            format!(
                "Failed to receive archive {} into {}",
                source.display(),
                upload_dir.display()
            )
        })?;
        claimed.keep();
        tracing::debug!("Received archive as {}", candidate.display());
        return Ok(candidate);
    }
    anyhow::bail!(
        "Failed to allocate an upload file name in {}",
        upload_dir.display()
    )
}

/// Owns a received archive file and deletes it when dropped.
#[derive(Debug)]
pub struct UploadedArchive {
    path: PathBuf,
    removed: bool,
}

impl UploadedArchive {
    pub fn adopt(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release ownership without deleting the file.
    fn keep(&mut self) {
        self.removed = true;
    }

    pub fn remove(&mut self) -> std::io::Result<()> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for UploadedArchive {
    fn drop(&mut self) {
        if let Err(err) = self.remove() {
            tracing::warn!(
                "Failed to remove uploaded archive {}: {}",
                self.path.display(),
                err
            );
        }
    }
}
