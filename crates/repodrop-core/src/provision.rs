//! Decide between first publish and update by attempting repository creation.

use crate::error::DeployError;
use crate::host::RepositoryHost;
use crate::types::{CommitIdentity, DeploymentRequest, RemoteRepositoryHandle, SyncMode};

/// Everything the sync step needs about the remote side.
#[derive(Clone)]
pub struct Provisioned {
    pub handle: RemoteRepositoryHandle,
    pub identity: CommitIdentity,
    /// HTTPS remote with the token embedded; never log this
    pub push_url: String,
}

impl std::fmt::Debug for Provisioned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioned")
            .field("handle", &self.handle)
            .field("identity", &self.identity)
            .field("push_url", &"***")
            .finish()
    }
}

/// Resolve the token's account, then create the repository or fall back to
/// update mode when the name is already taken.
pub async fn provision<H: RepositoryHost>(
    host: &H,
    request: &DeploymentRequest,
) -> Result<Provisioned, DeployError> {
    let user = host
        .current_user(request.auth_token())
        .await
        .map_err(|e| DeployError::Authentication(e.to_string()))?;

    let email = user
        .email
        .filter(|email| !email.trim().is_empty())
        .unwrap_or_else(|| host.noreply_email(&user.login));
    let identity = CommitIdentity {
        name: user.login.clone(),
        email,
    };

    tracing::info!(
        "Creating {} repository {}/{}",
        request.visibility(),
        user.login,
        request.repo_name()
    );
    let mode = match host
        .create_repository(
            request.auth_token(),
            request.repo_name(),
            request.visibility(),
        )
        .await
    {
        Ok(()) => SyncMode::Create,
        Err(err) if err.is_name_conflict() => {
            tracing::info!("Repository already exists, switching to update mode");
            SyncMode::Update
        }
        Err(err) => {
            return Err(DeployError::RepositoryProvisioning {
                status: err.status(),
                message: err.to_string(),
            });
        }
    };

    let push_url = host
        .push_url(&user.login, request.repo_name(), request.auth_token())
        .map_err(|e| DeployError::RepositoryProvisioning {
            status: None,
            message: e.to_string(),
        })?;

    Ok(Provisioned {
        handle: RemoteRepositoryHandle {
            html_url: host.html_url(&user.login, request.repo_name()),
            owner_login: user.login,
            mode,
        },
        identity,
        push_url,
    })
}
