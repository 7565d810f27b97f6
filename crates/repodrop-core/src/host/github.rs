//! GitHub REST API client.

use serde_json::{Value, json};
use url::Url;

use super::{HostError, HostUser, RepositoryHost};
use crate::config::GitHubConfig;
use crate::types::Visibility;

const ACCEPT: &str = "application/vnd.github.v3+json";

/// Talks to the GitHub REST API (or a compatible endpoint).
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base_url: String,
    git_host: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, HostError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            git_host: config.git_host.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    /// Turn a non-success response into a [`HostError::Status`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, HostError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HostError::Status {
            status: status.as_u16(),
            message: error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        })
    }
}

impl RepositoryHost for GitHubClient {
    async fn current_user(&self, token: &str) -> Result<HostUser, HostError> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("Authorization", format!("token {}", token))
            .header("Accept", ACCEPT)
            .send()
            .await?;
        let user = Self::check(response).await?.json::<HostUser>().await?;
        Ok(user)
    }

    async fn create_repository(
        &self,
        token: &str,
        name: &str,
        visibility: Visibility,
    ) -> Result<(), HostError> {
        let response = self
            .http
            .post(self.endpoint("user/repos"))
            .header("Authorization", format!("token {}", token))
            .header("Accept", ACCEPT)
            .json(&create_repository_body(name, visibility))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn push_url(&self, owner: &str, repo: &str, token: &str) -> Result<String, HostError> {
        let mut url = Url::parse(&format!("https://{}/{}/{}.git", self.git_host, owner, repo))
            .map_err(|e| HostError::InvalidUrl(e.to_string()))?;
        url.set_username(token)
            .map_err(|_| HostError::InvalidUrl("cannot embed credential".to_string()))?;
        Ok(url.to_string())
    }

    fn html_url(&self, owner: &str, repo: &str) -> String {
        format!("https://{}/{}/{}", self.git_host, owner, repo)
    }

    fn noreply_email(&self, login: &str) -> String {
        format!("{}@users.noreply.{}", login, self.git_host)
    }
}

fn create_repository_body(name: &str, visibility: Visibility) -> Value {
    json!({
        "name": name,
        "private": visibility.is_private(),
        "auto_init": false,
    })
}

/// Extract the `message` field GitHub puts in error bodies.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
