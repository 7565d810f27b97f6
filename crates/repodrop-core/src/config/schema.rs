//! Schema for repodrop.toml.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Parent directory for per-request workspaces
    pub workspace_root: PathBuf,
    /// Directory where received archives are stored until processed
    pub upload_dir: PathBuf,
    pub github: GitHubConfig,
    pub git: GitConfig,
    pub ignore: IgnoreConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        let base = std::env::temp_dir().join("repodrop");
        Self {
            workspace_root: base.join("extracted"),
            upload_dir: base.join("uploads"),
            github: GitHubConfig::default(),
            git: GitConfig::default(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl DeployConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.github.git_host.trim().is_empty() {
            anyhow::bail!("github.git_host must not be empty");
        }
        if self.github.api_base_url.trim().is_empty() {
            anyhow::bail!("github.api_base_url must not be empty");
        }
        if self.git.default_branch.trim().is_empty() {
            anyhow::bail!("git.default_branch must not be empty");
        }
        if self.git.preferred_branch.trim().is_empty() {
            anyhow::bail!("git.preferred_branch must not be empty");
        }
        for name in &self.ignore.cache_dirs {
            if name.contains('/') || name.contains('\\') || name.is_empty() {
                anyhow::bail!("ignore.cache_dirs entry '{}' must be a plain directory name", name);
            }
        }
        Ok(())
    }
}

/// Hosting API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base_url: String,
    /// Host used for HTTPS remotes and html links
    pub git_host: String,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            git_host: "github.com".to_string(),
            user_agent: concat!("repodrop/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Branch naming conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Branch used for first publish and as update fallback
    pub default_branch: String,
    /// Branch preferred in update mode when the remote has it
    pub preferred_branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: "master".to_string(),
            preferred_branch: "main".to_string(),
        }
    }
}

/// Ignore rules injected when a dependency cache is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    pub cache_dirs: Vec<String>,
    pub secret_files: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            cache_dirs: vec!["node_modules".to_string()],
            secret_files: vec![".env".to_string()],
        }
    }
}
