//! Core data model shared across the deployment pipeline.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

// =============================================================================
// Request
// =============================================================================

/// Repository visibility requested by the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn is_private(self) -> bool {
        self == Visibility::Private
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Raw, unvalidated fields as received by the submission interface.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub repo_name: Option<String>,
    pub visibility: Option<String>,
    pub auth_token: Option<String>,
    pub archive_path: Option<PathBuf>,
}

/// A validated deployment request. Immutable once accepted.
#[derive(Clone)]
pub struct DeploymentRequest {
    repo_name: String,
    visibility: Visibility,
    auth_token: String,
    archive_path: PathBuf,
}

impl DeploymentRequest {
    pub fn new(
        repo_name: &str,
        visibility: Visibility,
        auth_token: impl Into<String>,
        archive_path: impl Into<PathBuf>,
    ) -> Result<Self, DeployError> {
        let repo_name = sanitize_repo_name(repo_name);
        if repo_name.is_empty() {
            return Err(DeployError::IncompleteRequest(
                "repository name is empty after sanitizing".to_string(),
            ));
        }
        let auth_token = auth_token.into();
        if auth_token.trim().is_empty() {
            return Err(DeployError::IncompleteRequest(
                "GitHub token is missing".to_string(),
            ));
        }
        Ok(Self {
            repo_name,
            visibility,
            auth_token,
            archive_path: archive_path.into(),
        })
    }

    /// Validate a raw submission.
    ///
    /// On rejection the received archive file, if any, is removed so the
    /// caller never has to clean up after an incomplete request.
    pub fn from_submission(submission: Submission) -> Result<Self, DeployError> {
        let Submission {
            repo_name,
            visibility,
            auth_token,
            archive_path,
        } = submission;

        let result = Self::validate_fields(repo_name, visibility, auth_token, archive_path.clone());
        if result.is_err()
            && let Some(path) = archive_path
            && path.exists()
            && let Err(err) = std::fs::remove_file(&path)
        {
            tracing::warn!("Failed to remove rejected upload {}: {}", path.display(), err);
        }
        result
    }

    fn validate_fields(
        repo_name: Option<String>,
        visibility: Option<String>,
        auth_token: Option<String>,
        archive_path: Option<PathBuf>,
    ) -> Result<Self, DeployError> {
        let missing = |field: &str| DeployError::IncompleteRequest(format!("missing {}", field));

        let repo_name = repo_name.ok_or_else(|| missing("repository name"))?;
        let visibility = visibility.ok_or_else(|| missing("visibility"))?;
        let auth_token = auth_token.ok_or_else(|| missing("GitHub token"))?;
        let archive_path = archive_path.ok_or_else(|| missing("project archive"))?;

        let visibility = Visibility::parse(&visibility).ok_or_else(|| {
            DeployError::IncompleteRequest(format!(
                "visibility must be 'public' or 'private', got '{}'",
                visibility
            ))
        })?;

        Self::new(&repo_name, visibility, auth_token, archive_path)
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn archive_path(&self) -> &std::path::Path {
        &self.archive_path
    }
}

impl fmt::Debug for DeploymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentRequest")
            .field("repo_name", &self.repo_name)
            .field("visibility", &self.visibility)
            .field("auth_token", &"***")
            .field("archive_path", &self.archive_path)
            .finish()
    }
}

/// Normalize a repository name to `[A-Za-z0-9_-]+`.
///
/// Whitespace runs become a single `-`; every other disallowed character is
/// dropped.
pub fn sanitize_repo_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        }
    }
    out
}

// =============================================================================
// Provisioning
// =============================================================================

/// Whether the repository was just created or already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Create,
    Update,
}

/// The remote repository a deployment publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepositoryHandle {
    pub owner_login: String,
    pub html_url: String,
    pub mode: SyncMode,
}

/// Author/committer used for the deployment commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

// =============================================================================
// Results
// =============================================================================

/// Terminal value of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    pub repo_url: String,
    pub no_changes: bool,
}

impl SyncResult {
    pub fn published(repo_url: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "Deployed successfully.".to_string(),
            repo_url: repo_url.into(),
            no_changes: false,
        }
    }

    pub fn up_to_date(repo_url: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "Repository is already up to date.".to_string(),
            repo_url: repo_url.into(),
            no_changes: true,
        }
    }
}

/// Response contract returned to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeployResponse {
    #[serde(rename_all = "camelCase")]
    Success {
        success: bool,
        message: String,
        repo_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        no_changes: Option<bool>,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl DeployResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        DeployResponse::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeployResponse::Success { .. })
    }
}

impl From<SyncResult> for DeployResponse {
    fn from(result: SyncResult) -> Self {
        DeployResponse::Success {
            success: result.success,
            message: result.message,
            repo_url: result.repo_url,
            no_changes: result.no_changes.then_some(true),
        }
    }
}
