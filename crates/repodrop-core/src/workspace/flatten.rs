//! Collapse a single wrapper directory at the top of an extracted archive.
//!
//! Archives made by zipping a project folder contain exactly one top-level
//! directory. Planning is a pure function over a snapshot of the top-level
//! entries; applying the plan replaces the workspace directory in one rename.

use std::path::{Path, PathBuf};

/// OS and VCS metadata ignored when inspecting archive topology.
pub const HOUSEKEEPING_ENTRIES: &[&str] = &[".DS_Store", "__MACOSX", "Thumbs.db", ".git"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One top-level entry of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub name: String,
    pub kind: EntryKind,
}

impl EntrySnapshot {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    fn is_housekeeping(&self) -> bool {
        HOUSEKEEPING_ENTRIES.contains(&self.name.as_str())
    }
}

/// The wrapper directory whose contents become the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenPlan {
    pub wrapper: String,
}

/// Decide whether the snapshot has exactly one real entry and it is a directory.
pub fn plan_flatten(entries: &[EntrySnapshot]) -> Option<FlattenPlan> {
    let mut real = entries.iter().filter(|entry| !entry.is_housekeeping());
    let only = real.next()?;
    if real.next().is_some() || only.kind != EntryKind::Directory {
        return None;
    }
    Some(FlattenPlan {
        wrapper: only.name.clone(),
    })
}

/// Read the top-level entries of `dir`. Symlinks are reported as files.
pub fn snapshot_entries(dir: &Path) -> std::io::Result<Vec<EntrySnapshot>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name().to_string_lossy().to_string();
        entries.push(if file_type.is_dir() {
            EntrySnapshot::dir(name)
        } else {
            EntrySnapshot::file(name)
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Flatten `root` in place if it is wrapped in a single directory.
///
/// Never fails: problems are logged and the workspace is left as it was.
/// Returns whether the layout changed.
pub fn flatten_workspace(root: &Path) -> bool {
    let entries = match snapshot_entries(root) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("Flatten skipped, cannot read {}: {}", root.display(), err);
            return false;
        }
    };

    let Some(plan) = plan_flatten(&entries) else {
        return false;
    };

    match apply_plan(root, &plan) {
        Ok(()) => {
            tracing::info!("Flattened wrapper folder '{}'", plan.wrapper);
            true
        }
        Err(err) => {
            tracing::warn!("Failed to flatten wrapper folder '{}': {}", plan.wrapper, err);
            false
        }
    }
}

fn apply_plan(root: &Path, plan: &FlattenPlan) -> anyhow::Result<()> {
    apply_plan_with(root, plan, |from, to| std::fs::rename(from, to))
}

/// Apply `plan`, moving directories with `rename`.
///
/// On failure the wrapper is moved back under `root`. If even that fails the
/// staging directory is deleted so nothing is left outside the workspace.
fn apply_plan_with<R>(root: &Path, plan: &FlattenPlan, mut rename: R) -> anyhow::Result<()>
where
    R: FnMut(&Path, &Path) -> std::io::Result<()>,
{
    use anyhow::Context;

    let wrapper = root.join(&plan.wrapper);
    let staging = staging_path(root)?;

    rename(&wrapper, &staging)
        .with_context(|| format!("Failed to move {} aside", wrapper.display()))?;

    // Only housekeeping entries remain in root now.
    if let Err(err) = std::fs::remove_dir_all(root) {
        restore(root, &staging, &wrapper, &mut rename);
        return Err(err).with_context(|| format!("Failed to clear {}", root.display()));
    }

    if let Err(err) = rename(&staging, root) {
        restore(root, &staging, &wrapper, &mut rename);
        return Err(err).with_context(|| format!("Failed to replace {}", root.display()));
    }

    Ok(())
}

fn restore<R>(root: &Path, staging: &Path, wrapper: &Path, rename: &mut R)
where
    R: FnMut(&Path, &Path) -> std::io::Result<()>,
{
    let restored = std::fs::create_dir_all(root).and_then(|()| rename(staging, wrapper));
    let Err(err) = restored else {
        return;
    };

    tracing::warn!(
        "Could not restore {} from {}: {}",
        wrapper.display(),
        staging.display(),
        err
    );
    if let Err(err) = std::fs::remove_dir_all(staging) {
        tracing::warn!(
            "Failed to remove flatten staging directory {}: {}",
            staging.display(),
            err
        );
    }
}

/// A sibling of `root` on the same filesystem, so the final rename is atomic.
fn staging_path(root: &Path) -> anyhow::Result<PathBuf> {
    let parent = root
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Workspace has no parent: {}", root.display()))?;
    let base = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    for attempt in 0..100 {
        let candidate = parent.join(format!(".{}.flatten.{}", base, attempt));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    anyhow::bail!("Failed to allocate a staging directory in {}", parent.display())
}
