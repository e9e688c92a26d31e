//! GitHub REST calls used by script hosting
//!
//! Only two endpoints are needed: `POST /user/repos` and
//! `PUT /repos/{owner}/{repo}/contents/{path}`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::Engine;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const REPO_DESCRIPTION: &str = "Script repository created by Discord bot";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Body of `POST /user/repos`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepoRequest {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
}

impl CreateRepoRequest {
    /// Public, auto-initialised repository so the default branch exists
    pub fn public(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: REPO_DESCRIPTION.to_string(),
            private: false,
            auto_init: true,
        }
    }
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    pub message: String,
    /// Base64 of the file body
    pub content: String,
}

impl PutFileRequest {
    pub fn new(message: &str, raw_content: &str) -> Self {
        Self {
            message: message.to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(raw_content.as_bytes()),
        }
    }
}

/// Status plus the remote-reported message for non-success responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn ok(status: u16) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            message: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Statuses GitHub returns while a freshly created repository is not yet writable
    pub fn is_retryable(&self) -> bool {
        matches!(self.status, 404 | 409) || self.status >= 500
    }

    pub fn error_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// The subset of the GitHub API used by [`super::GitHubPublisher`]
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn create_repo(&self, request: &CreateRepoRequest) -> Result<ApiResponse>;

    async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<ApiResponse>;
}

/// reqwest-backed GitHub client authorised with a bearer token
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: &str, api_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("dotbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!("{}/repos/{owner}/{repo}/contents/{path}", self.api_url)
    }

    async fn read_response(response: reqwest::Response) -> ApiResponse {
        let status = response.status();
        if status.is_success() {
            return ApiResponse::ok(status.as_u16());
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()));

        ApiResponse {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn create_repo(&self, request: &CreateRepoRequest) -> Result<ApiResponse> {
        let url = format!("{}/user/repos", self.api_url);
        debug!("POST {url} (repo {})", request.name);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(request)
            .send()
            .await
            .map_err(|e| anyhow!("GitHub repository request failed: {e}"))?;

        Ok(Self::read_response(response).await)
    }

    async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<ApiResponse> {
        let url = self.contents_url(owner, repo, path);
        debug!("PUT {url}");

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(request)
            .send()
            .await
            .map_err(|e| anyhow!("GitHub contents request failed: {e}"))?;

        Ok(Self::read_response(response).await)
    }
}
