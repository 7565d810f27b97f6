//! Deployment orchestration.
//!
//! Sequences extraction, flattening, ignore injection, provisioning and git
//! synchronization for one request, and removes the workspace and the
//! received archive on every exit path.

use std::path::Path;

use crate::config::DeployConfig;
use crate::error::{DeployError, translate};
use crate::git::GitSyncEngine;
use crate::host::RepositoryHost;
use crate::intake::UploadedArchive;
use crate::provision::provision;
use crate::types::{DeployResponse, DeploymentRequest, Submission, SyncResult};
use crate::workspace::{
    Workspace, extract_archive, flatten_workspace, inject_ignore_rules, snapshot_entries,
};

/// Runs deployments against a repository host.
#[derive(Debug)]
pub struct DeployOrchestrator<H> {
    config: DeployConfig,
    host: H,
}

impl<H: RepositoryHost> DeployOrchestrator<H> {
    pub fn new(config: DeployConfig, host: H) -> Self {
        Self { config, host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Validate a raw submission and deploy it, producing the response contract.
    pub async fn handle(&self, submission: Submission) -> DeployResponse {
        match DeploymentRequest::from_submission(submission) {
            Ok(request) => self.respond(request).await,
            Err(err) => {
                tracing::warn!("Rejected submission: {}", err);
                DeployResponse::failure(err.to_string())
            }
        }
    }

    /// Deploy and translate any failure into a user-facing message.
    pub async fn respond(&self, request: DeploymentRequest) -> DeployResponse {
        let repo_name = request.repo_name().to_string();
        match self.deploy(request).await {
            Ok(result) => result.into(),
            Err(err) => {
                tracing::error!("Deployment of '{}' failed: {}", repo_name, err);
                DeployResponse::failure(translate(&err, &repo_name))
            }
        }
    }

    /// Deploy one request.
    ///
    /// The received archive and the workspace are gone when this returns,
    /// whatever the outcome.
    pub async fn deploy(&self, request: DeploymentRequest) -> Result<SyncResult, DeployError> {
        let mut archive = UploadedArchive::adopt(request.archive_path());

        let result = match Workspace::create(&self.config.workspace_root, request.repo_name()) {
            Ok(mut workspace) => {
                let result = self.run_pipeline(&request, workspace.path()).await;
                if let Err(err) = workspace.cleanup() {
                    tracing::warn!(
                        "Failed to remove workspace {}: {}",
                        workspace.path().display(),
                        err
                    );
                }
                result
            }
            Err(err) => Err(err),
        };

        if let Err(err) = archive.remove() {
            tracing::warn!(
                "Failed to remove uploaded archive {}: {}",
                archive.path().display(),
                err
            );
        }
        result
    }

    async fn run_pipeline(
        &self,
        request: &DeploymentRequest,
        root: &Path,
    ) -> Result<SyncResult, DeployError> {
        tracing::info!("Extracting project archive for '{}'", request.repo_name());
        extract_archive(request.archive_path(), root)?;

        flatten_workspace(root);
        if let Ok(entries) = snapshot_entries(root) {
            let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
            tracing::debug!("Workspace contents: {}", names.join(", "));
        }

        inject_ignore_rules(root, &self.config.ignore);

        let provisioned = provision(&self.host, request).await?;
        let repo_url = provisioned.handle.html_url.clone();

        let outcome = GitSyncEngine::new(root, &self.config.git)
            .with_secret(request.auth_token())
            .sync(
                provisioned.handle.mode,
                &provisioned.push_url,
                &provisioned.identity,
            )?;

        if outcome.is_noop() {
            tracing::info!("'{}' is up to date on {}", request.repo_name(), outcome.branch);
            Ok(SyncResult::up_to_date(repo_url))
        } else {
            tracing::info!(
                "Deployed '{}' to {} ({} changed files on {})",
                request.repo_name(),
                repo_url,
                outcome.changed_files,
                outcome.branch
            );
            Ok(SyncResult::published(repo_url))
        }
    }
}
