//! End-to-end deployment tests against a local bare repository.

mod support;

use std::path::{Path, PathBuf};

use repodrop_core::config::DeployConfig;
use repodrop_core::deploy::DeployOrchestrator;
use repodrop_core::error::DeployError;
use repodrop_core::types::{DeployResponse, DeploymentRequest, Submission, Visibility};
use tempfile::TempDir;

use support::archive::{dir_entries, write_zip};
use support::git::{commit_count, file_at, has_branch, init_bare, seed_remote, tip_commit};
use support::host::FakeHost;

struct Fixture {
    temp: TempDir,
    config: DeployConfig,
    remote: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let remote = temp.path().join("remote.git");
        init_bare(&remote);
        let config = DeployConfig {
            workspace_root: temp.path().join("extracted"),
            upload_dir: temp.path().join("uploads"),
            ..DeployConfig::default()
        };
        Self {
            temp,
            config,
            remote,
        }
    }

    /// Write an archive into the upload dir, as the intake would.
    fn upload(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        std::fs::create_dir_all(&self.config.upload_dir).unwrap();
        let path = self.config.upload_dir.join(name);
        write_zip(&path, files);
        path
    }

    fn request(&self, archive: &Path) -> DeploymentRequest {
        DeploymentRequest::new("my-app", Visibility::Public, "test-token", archive).unwrap()
    }

    fn orchestrator(&self, host: FakeHost) -> DeployOrchestrator<FakeHost> {
        DeployOrchestrator::new(self.config.clone(), host)
    }

    fn assert_no_leftovers(&self, archive: &Path) {
        assert!(!archive.exists(), "uploaded archive should be removed");
        assert!(
            dir_entries(&self.config.workspace_root).is_empty(),
            "workspace root should be empty, found {:?}",
            dir_entries(&self.config.workspace_root)
        );
    }
}

// =========================================================================
// Create mode
// =========================================================================

#[tokio::test]
async fn first_deploy_publishes_flattened_project() {
    let fx = Fixture::new();
    let archive = fx.upload(
        "site.zip",
        &[
            ("MyProject/index.html", "<h1>hi</h1>"),
            ("MyProject/src/app.js", "console.log(1);"),
            ("MyProject/node_modules/dep/index.js", "module.exports = 1;"),
            ("__MACOSX/MyProject/._index.html", "junk"),
        ],
    );
    let orchestrator = fx.orchestrator(FakeHost::new(fx.remote.clone()));

    let result = orchestrator.deploy(fx.request(&archive)).await.unwrap();

    assert!(result.success);
    assert!(!result.no_changes);
    assert_eq!(result.repo_url, "https://example.test/octocat/my-app");

    assert!(has_branch(&fx.remote, "master"));
    assert_eq!(
        file_at(&fx.remote, "master", "index.html").as_deref(),
        Some("<h1>hi</h1>")
    );
    assert!(file_at(&fx.remote, "master", "src/app.js").is_some());
    assert!(file_at(&fx.remote, "master", "MyProject/index.html").is_none());
    assert!(file_at(&fx.remote, "master", "node_modules/dep/index.js").is_none());

    let gitignore = file_at(&fx.remote, "master", ".gitignore").unwrap();
    assert!(gitignore.lines().any(|l| l == "node_modules/"));
    assert!(gitignore.lines().any(|l| l == ".env"));

    let (summary, email) = tip_commit(&fx.remote, "master");
    assert_eq!(summary, "Initial commit");
    assert_eq!(email, "octocat@example.test");

    assert_eq!(
        orchestrator.host().calls(),
        vec!["user".to_string(), "create:my-app:public".to_string()]
    );
    fx.assert_no_leftovers(&archive);
}

#[tokio::test]
async fn missing_email_falls_back_to_noreply() {
    let fx = Fixture::new();
    let archive = fx.upload("a.zip", &[("a.txt", "a"), ("b.txt", "b")]);
    let mut host = FakeHost::new(fx.remote.clone());
    host.email = None;

    fx.orchestrator(host)
        .deploy(fx.request(&archive))
        .await
        .unwrap();

    let (_, email) = tip_commit(&fx.remote, "master");
    assert_eq!(email, "octocat@users.noreply.example.test");
}

#[tokio::test]
async fn private_visibility_is_requested() {
    let fx = Fixture::new();
    let archive = fx.upload("a.zip", &[("a.txt", "a")]);
    let orchestrator = fx.orchestrator(FakeHost::new(fx.remote.clone()));
    let request =
        DeploymentRequest::new("secret app", Visibility::Private, "test-token", &archive).unwrap();

    orchestrator.deploy(request).await.unwrap();

    assert!(
        orchestrator
            .host()
            .calls()
            .contains(&"create:secret-app:private".to_string())
    );
}

// =========================================================================
// Update mode
// =========================================================================

#[tokio::test]
async fn redeploying_identical_archive_is_noop() {
    let fx = Fixture::new();
    let files = [("index.html", "v1"), ("README.md", "readme")];

    let archive = fx.upload("first.zip", &files);
    fx.orchestrator(FakeHost::new(fx.remote.clone()))
        .deploy(fx.request(&archive))
        .await
        .unwrap();
    assert_eq!(commit_count(&fx.remote, "master"), 1);

    let archive = fx.upload("second.zip", &files);
    let orchestrator = fx.orchestrator(FakeHost::new(fx.remote.clone()).existing_repository());
    let result = orchestrator.deploy(fx.request(&archive)).await.unwrap();

    assert!(result.success);
    assert!(result.no_changes);
    assert_eq!(commit_count(&fx.remote, "master"), 1);
    fx.assert_no_leftovers(&archive);
}

#[tokio::test]
async fn update_prefers_main_and_last_deploy_wins() {
    let fx = Fixture::new();
    seed_remote(
        &fx.remote,
        &fx.temp.path().join("seed"),
        "main",
        &[("keep.txt", "old"), ("remote-only.txt", "edited on the web")],
    );

    let archive = fx.upload(
        "update.zip",
        &[("keep.txt", "new"), ("added.txt", "added")],
    );
    let orchestrator = fx.orchestrator(FakeHost::new(fx.remote.clone()).existing_repository());
    let result = orchestrator.deploy(fx.request(&archive)).await.unwrap();

    assert!(result.success);
    assert!(!result.no_changes);
    assert!(!has_branch(&fx.remote, "master"));
    assert_eq!(commit_count(&fx.remote, "main"), 2);
    assert_eq!(file_at(&fx.remote, "main", "keep.txt").as_deref(), Some("new"));
    assert_eq!(file_at(&fx.remote, "main", "added.txt").as_deref(), Some("added"));
    assert!(file_at(&fx.remote, "main", "remote-only.txt").is_none());

    let (summary, _) = tip_commit(&fx.remote, "main");
    assert!(summary.starts_with("Update: "), "got {}", summary);
    fx.assert_no_leftovers(&archive);
}

#[tokio::test]
async fn update_onto_empty_remote_tolerates_failed_reset() {
    let fx = Fixture::new();
    let archive = fx.upload("a.zip", &[("a.txt", "a")]);
    let orchestrator = fx.orchestrator(FakeHost::new(fx.remote.clone()).existing_repository());

    let result = orchestrator.deploy(fx.request(&archive)).await.unwrap();

    assert!(!result.no_changes);
    assert_eq!(file_at(&fx.remote, "master", "a.txt").as_deref(), Some("a"));
    let (summary, _) = tip_commit(&fx.remote, "master");
    assert!(summary.starts_with("Update: "));
}

// =========================================================================
// Failures
// =========================================================================

#[tokio::test]
async fn bad_token_fails_before_repository_creation() {
    let fx = Fixture::new();
    let archive = fx.upload("a.zip", &[("a.txt", "a")]);
    let mut host = FakeHost::new(fx.remote.clone());
    host.user_status = Some(401);
    let orchestrator = fx.orchestrator(host);

    let response = orchestrator.respond(fx.request(&archive)).await;

    match response {
        DeployResponse::Failure { success, error } => {
            assert!(!success);
            assert!(error.contains("token"), "got {}", error);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(orchestrator.host().calls(), vec!["user".to_string()]);
    assert!(!has_branch(&fx.remote, "master"));
    fx.assert_no_leftovers(&archive);
}

#[tokio::test]
async fn corrupt_archive_cleans_up_without_touching_remote() {
    let fx = Fixture::new();
    std::fs::create_dir_all(&fx.config.upload_dir).unwrap();
    let archive = fx.config.upload_dir.join("broken.zip");
    std::fs::write(&archive, b"this is not a zip").unwrap();
    let orchestrator = fx.orchestrator(FakeHost::new(fx.remote.clone()));

    let err = orchestrator.deploy(fx.request(&archive)).await.unwrap_err();

    assert!(matches!(err, DeployError::ArchiveCorrupt(_)));
    assert!(orchestrator.host().calls().is_empty());
    fx.assert_no_leftovers(&archive);
}

#[tokio::test]
async fn provisioning_failure_is_reported_with_status() {
    let fx = Fixture::new();
    let archive = fx.upload("a.zip", &[("a.txt", "a")]);
    let mut host = FakeHost::new(fx.remote.clone());
    host.create_status = Some(503);

    let err = fx
        .orchestrator(host)
        .deploy(fx.request(&archive))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::RepositoryProvisioning {
            status: Some(503),
            ..
        }
    ));
    fx.assert_no_leftovers(&archive);
}

#[tokio::test]
async fn push_failure_is_a_sync_error_and_cleans_up() {
    let fx = Fixture::new();
    let archive = fx.upload("a.zip", &[("a.txt", "a")]);
    let host = FakeHost::new(fx.temp.path().join("does-not-exist.git"));
    let orchestrator = fx.orchestrator(host);

    let err = orchestrator
        .deploy(fx.request(&archive))
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Sync(_)));
    assert!(!err.to_string().contains("test-token"));
    fx.assert_no_leftovers(&archive);

    let archive = fx.upload("b.zip", &[("a.txt", "a")]);
    let response = orchestrator.respond(fx.request(&archive)).await;
    assert_eq!(
        response,
        DeployResponse::failure("Git operation failed. Check your network connection.")
    );
}

#[tokio::test]
async fn incomplete_submission_is_rejected_and_upload_released() {
    let fx = Fixture::new();
    let archive = fx.upload("a.zip", &[("a.txt", "a")]);
    let orchestrator = fx.orchestrator(FakeHost::new(fx.remote.clone()));

    let response = orchestrator
        .handle(Submission {
            repo_name: Some("my-app".to_string()),
            visibility: Some("public".to_string()),
            auth_token: None,
            archive_path: Some(archive.clone()),
        })
        .await;

    assert!(!response.is_success());
    assert!(orchestrator.host().calls().is_empty());
    assert!(!archive.exists());
}

#[tokio::test]
async fn complete_submission_is_deployed() {
    let fx = Fixture::new();
    let archive = fx.upload("a.zip", &[("a.txt", "a")]);
    let orchestrator = fx.orchestrator(FakeHost::new(fx.remote.clone()));

    let response = orchestrator
        .handle(Submission {
            repo_name: Some(" my  app ".to_string()),
            visibility: Some("public".to_string()),
            auth_token: Some("test-token".to_string()),
            archive_path: Some(archive.clone()),
        })
        .await;

    assert!(response.is_success());
    assert!(
        orchestrator
            .host()
            .calls()
            .contains(&"create:my-app:public".to_string())
    );
    fx.assert_no_leftovers(&archive);
}
