//! Configuration for the deployment pipeline.
//!
//! Settings that would otherwise be process-wide (upload directory, workspace
//! root, API endpoint) live in [`DeployConfig`] and are handed to the
//! orchestrator at construction.

mod parser;
mod schema;
mod store;

pub use parser::{parse_config_str, parse_config_toml, to_toml};
pub use schema::{DeployConfig, GitConfig, GitHubConfig, IgnoreConfig};
pub use store::ConfigStore;
