//! Per-request workspace directories.
//!
//! A workspace holds one deployment's extracted project files. It is created
//! empty under the configured root, populated by extraction, flattening and
//! ignore injection, and removed on every exit path.

mod extract;
mod flatten;
mod ignore;

use std::path::{Path, PathBuf};

pub use extract::{ExtractSummary, extract_archive};
pub use flatten::{
    EntryKind, EntrySnapshot, FlattenPlan, HOUSEKEEPING_ENTRIES, flatten_workspace, plan_flatten,
    snapshot_entries,
};
pub use ignore::inject_ignore_rules;

use crate::error::DeployError;

/// An exclusively owned, uniquely named working directory.
///
/// Dropping a `Workspace` removes the directory; [`Workspace::cleanup`] does
/// the same but reports failures.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create `<root>/<unix-millis>_<repo_name>`, adding a suffix on collision.
    pub fn create(root: &Path, repo_name: &str) -> Result<Self, DeployError> {
        std::fs::create_dir_all(root).map_err(|e| {
            DeployError::Workspace(format!(
                "failed to create workspace root {}: {}",
                root.display(),
                e
            ))
        })?;

        let stamp = chrono::Utc::now().timestamp_millis();
        for attempt in 0..100 {
            let name = if attempt == 0 {
                format!("{}_{}", stamp, repo_name)
            } else {
                format!("{}_{}.{}", stamp, repo_name, attempt)
            };
            let candidate = root.join(name);
            match std::fs::create_dir(&candidate) {
                Ok(()) => {
                    tracing::debug!("Created workspace {}", candidate.display());
                    return Ok(Self {
                        path: candidate,
                        removed: false,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(DeployError::Workspace(format!(
                        "failed to create workspace {}: {}",
                        candidate.display(),
                        e
                    )));
                }
            }
        }
        Err(DeployError::Workspace(format!(
            "failed to allocate a workspace directory in {}",
            root.display()
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace directory recursively.
    pub fn cleanup(&mut self) -> std::io::Result<()> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(err) = self.cleanup() {
            tracing::warn!(
                "Failed to remove workspace {}: {}",
                self.path.display(),
                err
            );
        }
    }
}
