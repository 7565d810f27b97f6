//! Repodrop Core Library
//!
//! Publishes a zipped project to a hosted git repository: the archive is
//! extracted into an isolated workspace, normalized, and pushed either as a
//! brand new repository or as an update onto an existing one.

pub mod config;
pub mod deploy;
pub mod error;
pub mod git;
pub mod host;
pub mod intake;
pub mod provision;
pub mod types;
pub mod workspace;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, DeployConfig};

    // Pipeline
    pub use crate::deploy::DeployOrchestrator;
    pub use crate::error::{DeployError, translate};
    pub use crate::host::{GitHubClient, HostError, HostUser, RepositoryHost};

    // Data model
    pub use crate::types::{
        CommitIdentity, DeployResponse, DeploymentRequest, RemoteRepositoryHandle, Submission,
        SyncMode, SyncResult, Visibility,
    };
}
