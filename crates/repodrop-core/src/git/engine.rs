//! Init, attach, stage, commit and push a workspace.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};

use crate::config::GitConfig;
use crate::error::DeployError;
use crate::types::{CommitIdentity, SyncMode};

/// Variables that would redirect git away from the workspace.
const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

/// Result of a synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Branch that was (or would have been) pushed
    pub branch: String,
    /// Entries reported by status after staging
    pub changed_files: usize,
    /// Commit created, `None` when there was nothing to commit
    pub commit: Option<String>,
}

impl SyncOutcome {
    pub fn is_noop(&self) -> bool {
        self.commit.is_none()
    }
}

/// Publishes the contents of one workspace directory.
#[derive(Debug)]
pub struct GitSyncEngine {
    workdir: PathBuf,
    default_branch: String,
    preferred_branch: String,
    secrets: Vec<String>,
}

impl GitSyncEngine {
    pub fn new(workdir: &Path, config: &GitConfig) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            default_branch: config.default_branch.clone(),
            preferred_branch: config.preferred_branch.clone(),
            secrets: Vec::new(),
        }
    }

    /// Register a value that must never appear in error messages or logs.
    pub fn with_secret(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.secrets.push(secret.to_string());
        }
        self
    }

    /// Synchronize the workspace onto `push_url`.
    ///
    /// In update mode the local history is pointed at the remote branch tip
    /// while keeping the extracted files, so whatever the archive contains
    /// replaces the remote content (last deploy wins).
    pub fn sync(
        mut self,
        mode: SyncMode,
        push_url: &str,
        identity: &CommitIdentity,
    ) -> Result<SyncOutcome, DeployError> {
        self.register_url_credentials(push_url);
        self.init()?;
        self.run_git(&["remote", "add", "origin", push_url])?;
        self.run_git(&["config", "user.name", &identity.name])?;
        self.run_git(&["config", "user.email", &identity.email])?;

        let branch = match mode {
            SyncMode::Create => {
                let branch = self.default_branch.clone();
                self.point_head_at(&branch)?;
                branch
            }
            SyncMode::Update => self.attach_to_remote()?,
        };

        tracing::debug!("Staging workspace contents");
        self.run_git(&["add", "-A", "."])?;

        let changed_files = self.changed_files()?;
        if changed_files == 0 {
            tracing::info!("No file changes detected, skipping commit");
            return Ok(SyncOutcome {
                branch,
                changed_files,
                commit: None,
            });
        }

        tracing::info!("Detected {} changes, committing", changed_files);
        let message = commit_message(mode, Local::now());
        self.run_git(&["commit", "--no-verify", "-m", &message])?;
        let commit = self.head_commit()?;

        tracing::info!("Pushing to {}", branch);
        self.run_git(&["push", "-u", "origin", &branch])?;

        Ok(SyncOutcome {
            branch,
            changed_files,
            commit: Some(commit),
        })
    }

    /// Start a fresh repository, dropping any `.git` shipped inside the archive.
    fn init(&self) -> Result<(), DeployError> {
        let stale = self.workdir.join(".git");
        if stale.exists() {
            tracing::debug!("Removing git metadata found in archive");
            let removed = if stale.is_dir() {
                std::fs::remove_dir_all(&stale)
            } else {
                std::fs::remove_file(&stale)
            };
            removed.map_err(|e| {
                DeployError::Sync(format!("failed to remove {}: {}", stale.display(), e))
            })?;
        }
        self.run_git(&["init"])?;
        Ok(())
    }

    fn point_head_at(&self, branch: &str) -> Result<(), DeployError> {
        self.run_git(&["symbolic-ref", "HEAD", &format!("refs/heads/{}", branch)])?;
        Ok(())
    }

    /// Fetch the remote, pick the branch to publish to, and adopt its history.
    fn attach_to_remote(&self) -> Result<String, DeployError> {
        tracing::info!("Update mode: synchronizing with remote");
        self.run_git(&["fetch", "origin"])?;

        let remote_branches = self.run_git(&["branch", "-r", "--format=%(refname:short)"])?;
        let preferred = format!("origin/{}", self.preferred_branch);
        let branch = if remote_branches.lines().any(|line| line.trim() == preferred) {
            self.preferred_branch.clone()
        } else {
            self.default_branch.clone()
        };

        self.point_head_at(&branch)?;

        let upstream = format!("origin/{}", branch);
        if let Err(err) = self.run_git(&["reset", "--mixed", &upstream]) {
            tracing::info!("Reset skipped, remote may be empty: {}", err);
        }
        Ok(branch)
    }

    /// Count staged and unstaged entries that differ from HEAD.
    fn changed_files(&self) -> Result<usize, DeployError> {
        let repo = git2::Repository::open(&self.workdir)
            .map_err(|e| DeployError::Sync(format!("failed to open repository: {}", e)))?;
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = repo
            .statuses(Some(&mut opts))
            .map_err(|e| DeployError::Sync(format!("status failed: {}", e)))?;
        Ok(statuses.len())
    }

    fn head_commit(&self) -> Result<String, DeployError> {
        let repo = git2::Repository::open(&self.workdir)
            .map_err(|e| DeployError::Sync(format!("failed to open repository: {}", e)))?;
        let commit = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| DeployError::Sync(format!("failed to resolve HEAD: {}", e)))?;
        Ok(commit.id().to_string())
    }

    fn register_url_credentials(&mut self, push_url: &str) {
        if let Ok(url) = url::Url::parse(push_url) {
            if !url.username().is_empty() {
                self.secrets.push(url.username().to_string());
            }
            if let Some(password) = url.password() {
                self.secrets.push(password.to_string());
            }
        }
    }

    fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for secret in &self.secrets {
            out = out.replace(secret.as_str(), "***");
        }
        out
    }

    /// Run a git command in the workspace and return its stdout.
    fn run_git(&self, args: &[&str]) -> Result<String, DeployError> {
        let mut cmd = Command::new("git");
        for key in GIT_ENV_OVERRIDES {
            cmd.env_remove(key);
        }
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .arg("-c")
            .arg(format!("safe.directory={}", self.workdir.display()))
            .arg("-c")
            .arg("commit.gpgsign=false")
            .args(args)
            .current_dir(&self.workdir);

        let shown = self.redact(&args.join(" "));
        let output = cmd
            .output()
            .map_err(|e| DeployError::Sync(format!("{}: failed to invoke git: {}", shown, e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::Sync(format!(
                "{} failed: {}",
                shown,
                self.redact(stderr.trim())
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Commit message for a deployment.
pub fn commit_message(mode: SyncMode, now: DateTime<Local>) -> String {
    match mode {
        SyncMode::Create => "Initial commit".to_string(),
        SyncMode::Update => format!("Update: {}", now.format("%Y-%m-%d %H:%M:%S")),
    }
}
