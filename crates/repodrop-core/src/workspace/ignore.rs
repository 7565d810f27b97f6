//! Append exclusion rules for dependency caches and secrets to .gitignore.

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::config::IgnoreConfig;

/// Add ignore rules when the workspace root contains a dependency cache.
///
/// Best-effort: errors are logged and an empty list is returned. Existing
/// `.gitignore` content is kept verbatim; rules already present are not
/// repeated. Returns the rules that were appended.
pub fn inject_ignore_rules(root: &Path, config: &IgnoreConfig) -> Vec<String> {
    let detected: Vec<&String> = config
        .cache_dirs
        .iter()
        .filter(|name| root.join(name.as_str()).is_dir())
        .collect();

    if detected.is_empty() {
        return Vec::new();
    }

    let mut rules: Vec<String> = detected.iter().map(|name| format!("{}/", name)).collect();
    rules.extend(config.secret_files.iter().cloned());

    match append_rules(root, &rules) {
        Ok(added) => {
            if !added.is_empty() {
                tracing::info!(
                    "Detected dependency cache, added to .gitignore: {}",
                    added.join(", ")
                );
            }
            added
        }
        Err(err) => {
            tracing::warn!("Failed to update .gitignore: {:#}", err);
            Vec::new()
        }
    }
}

fn append_rules(root: &Path, rules: &[String]) -> anyhow::Result<Vec<String>> {
    let ignore_path = root.join(".gitignore");
    let existing = if ignore_path.exists() {
        fs::read_to_string(&ignore_path)
            .with_context(|| format!("Failed to read {}", ignore_path.display()))?
    } else {
        String::new()
    };

    let added: Vec<String> = rules
        .iter()
        .filter(|rule| !existing.lines().any(|line| line.trim() == rule.as_str()))
        .cloned()
        .collect();

    if added.is_empty() {
        return Ok(added);
    }

    let mut next = existing;
    if !next.is_empty() && !next.ends_with('\n') {
        next.push('\n');
    }
    for rule in &added {
        next.push_str(rule);
        next.push('\n');
    }

    fs::write(&ignore_path, next)
        .with_context(|| format!("Failed to write {}", ignore_path.display()))?;
    Ok(added)
}
