//! Remote repository hosting API.
//!
//! [`RepositoryHost`] is the seam between the pipeline and the hosting
//! service; [`GitHubClient`] is the production implementation.

mod github;

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::types::Visibility;

pub use github::GitHubClient;

/// Account behind an access token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostUser {
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),
}

impl HostError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HostError::Status { status, .. } => Some(*status),
            HostError::Transport(err) => err.status().map(|s| s.as_u16()),
            HostError::InvalidUrl(_) => None,
        }
    }

    /// The host refused to create a repository because the name is taken or invalid.
    pub fn is_name_conflict(&self) -> bool {
        self.status() == Some(422)
    }
}

/// Operations the pipeline needs from a hosting service.
pub trait RepositoryHost {
    /// Resolve the account that owns `token`.
    fn current_user(&self, token: &str) -> impl Future<Output = Result<HostUser, HostError>> + Send;

    /// Create a repository for the authenticated account.
    fn create_repository(
        &self,
        token: &str,
        name: &str,
        visibility: Visibility,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Remote URL git pushes to, carrying `token` as the credential.
    fn push_url(&self, owner: &str, repo: &str, token: &str) -> Result<String, HostError>;

    /// Browser URL of the repository.
    fn html_url(&self, owner: &str, repo: &str) -> String;

    /// Address used when the account does not expose an email.
    fn noreply_email(&self, login: &str) -> String;
}
