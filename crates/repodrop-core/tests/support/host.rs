use std::path::PathBuf;
use std::sync::Mutex;

use repodrop_core::host::{HostError, HostUser, RepositoryHost};
use repodrop_core::types::Visibility;

/// In-memory hosting service whose "remote" is a local bare repository.
#[derive(Debug)]
pub struct FakeHost {
    pub login: String,
    pub email: Option<String>,
    pub remote: PathBuf,
    /// Status returned by the user endpoint instead of success
    pub user_status: Option<u16>,
    /// Status returned by repository creation instead of success
    pub create_status: Option<u16>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new(remote: PathBuf) -> Self {
        Self {
            login: "octocat".to_string(),
            email: Some("octocat@example.test".to_string()),
            remote,
            user_status: None,
            create_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn existing_repository(mut self) -> Self {
        self.create_status = Some(422);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl RepositoryHost for FakeHost {
    async fn current_user(&self, _token: &str) -> Result<HostUser, HostError> {
        self.record("user".to_string());
        if let Some(status) = self.user_status {
            return Err(HostError::Status {
                status,
                message: "Bad credentials".to_string(),
            });
        }
        Ok(HostUser {
            login: self.login.clone(),
            email: self.email.clone(),
        })
    }

    async fn create_repository(
        &self,
        _token: &str,
        name: &str,
        visibility: Visibility,
    ) -> Result<(), HostError> {
        self.record(format!("create:{}:{}", name, visibility));
        if let Some(status) = self.create_status {
            return Err(HostError::Status {
                status,
                message: "Repository creation failed.".to_string(),
            });
        }
        Ok(())
    }

    fn push_url(&self, _owner: &str, _repo: &str, _token: &str) -> Result<String, HostError> {
        Ok(self.remote.to_string_lossy().to_string())
    }

    fn html_url(&self, owner: &str, repo: &str) -> String {
        format!("https://example.test/{}/{}", owner, repo)
    }

    fn noreply_email(&self, login: &str) -> String {
        format!("{}@users.noreply.example.test", login)
    }
}
