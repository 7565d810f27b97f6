//! Config store for locating and loading repodrop.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{DeployConfig, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Use the per-user config location (`<config_dir>/repodrop/repodrop.toml`).
    pub fn from_default_location() -> anyhow::Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("repodrop");
        Ok(Self::from_path(config_dir.join("repodrop.toml")))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, falling back to defaults when the file is absent.
    pub fn load(&self) -> anyhow::Result<DeployConfig> {
        if !self.config_path.exists() {
            tracing::debug!(
                "No config at {}, using defaults",
                self.config_path.display()
            );
            return Ok(DeployConfig::default());
        }
        parser::parse_config_toml(&self.config_path)
    }

    pub fn save(&self, config: &DeployConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
