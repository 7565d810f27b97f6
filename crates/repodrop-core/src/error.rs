//! Deployment error kinds and their user-facing translation.

use thiserror::Error;

/// Every way a deployment can terminate unsuccessfully.
///
/// All variants except [`DeployError::IncompleteRequest`] are raised after the
/// workspace exists and are reported only after it has been cleaned up.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A required submission field or the archive itself is missing.
    #[error("Incomplete request: {0}")]
    IncompleteRequest(String),

    /// The token could not be used to resolve the authenticated account.
    #[error("Failed to resolve GitHub user, the token may be invalid: {0}")]
    Authentication(String),

    /// The archive could not be parsed or extraction did not complete.
    #[error("Archive is corrupt or could not be extracted: {0}")]
    ArchiveCorrupt(String),

    /// Repository creation failed for a reason other than a name conflict.
    #[error("Failed to create repository: {message}")]
    RepositoryProvisioning {
        status: Option<u16>,
        message: String,
    },

    /// A git command failed during synchronization.
    #[error("git {0}")]
    Sync(String),

    /// The workspace directory could not be prepared.
    #[error("Workspace error: {0}")]
    Workspace(String),
}

impl DeployError {
    /// HTTP status attached to the failure, if it came from the hosting API.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            DeployError::RepositoryProvisioning { status, .. } => *status,
            _ => None,
        }
    }
}

/// Map a deployment error to the short message shown to the submitter.
///
/// Pure and side-effect free; only used for reporting.
pub fn translate(error: &DeployError, repo_name: &str) -> String {
    match error.http_status() {
        Some(422) => {
            return format!("Repository name '{}' is already in use or invalid.", repo_name);
        }
        Some(401) => return "GitHub token was rejected.".to_string(),
        _ => {}
    }

    match error {
        DeployError::Authentication(_) => "GitHub token was rejected.".to_string(),
        DeployError::Sync(_) => "Git operation failed. Check your network connection.".to_string(),
        other => other.to_string(),
    }
}
