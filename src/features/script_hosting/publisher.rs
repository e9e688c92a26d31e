//! Two-step script publication: create a repository, then upload the file
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Settle delay plus doubling backoff on not-yet-writable repositories

use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use super::github::{CreateRepoRequest, GitHubApi, PutFileRequest};

pub const DEFAULT_RAW_HOST: &str = "raw.githubusercontent.com";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_UPLOAD_ATTEMPTS: u32 = 3;

const UPLOAD_COMMIT_MESSAGE: &str = "Upload script file";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("Failed to create repository: {0}")]
    RepositoryCreation(String),
    #[error("Failed to upload file: {0}")]
    Upload(String),
    /// Carries the transport failure for logs; users see the fixed text
    #[error("Failed to interact with GitHub API")]
    Transport(String),
}

/// Publishes text content and returns a public raw-content URL
#[async_trait]
pub trait ScriptPublisher: Send + Sync {
    async fn publish(
        &self,
        repo_name: &str,
        file_name: &str,
        content: &str,
    ) -> Result<String, PublishError>;
}

#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub owner: String,
    pub branch: String,
    pub raw_host: String,
    /// Wait between repository creation and the first upload attempt
    pub settle_delay: Duration,
    pub max_attempts: u32,
}

impl PublishSettings {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            raw_host: DEFAULT_RAW_HOST.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_attempts: DEFAULT_UPLOAD_ATTEMPTS,
        }
    }
}

/// `https://<raw-host>/<owner>/<repo>/<branch>/<path>`
pub fn raw_content_url(raw_host: &str, owner: &str, repo: &str, branch: &str, path: &str) -> String {
    format!("https://{raw_host}/{owner}/{repo}/{branch}/{path}")
}

pub struct GitHubPublisher<A> {
    api: A,
    settings: PublishSettings,
}

impl<A: GitHubApi> GitHubPublisher<A> {
    pub fn new(api: A, settings: PublishSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    async fn create_repository(&self, repo_name: &str) -> Result<(), PublishError> {
        let response = self
            .api
            .create_repo(&CreateRepoRequest::public(repo_name))
            .await
            .map_err(|e| {
                warn!("GitHub repository creation failed: {e}");
                PublishError::Transport(e.to_string())
            })?;

        if !response.is_success() {
            warn!(
                "GitHub rejected repository {repo_name} ({}): {}",
                response.status,
                response.error_message()
            );
            return Err(PublishError::RepositoryCreation(response.error_message()));
        }

        info!("📦 Created repository {}/{repo_name}", self.settings.owner);
        Ok(())
    }

    async fn upload_file(
        &self,
        repo_name: &str,
        file_name: &str,
        content: &str,
    ) -> Result<(), PublishError> {
        let request = PutFileRequest::new(UPLOAD_COMMIT_MESSAGE, content);
        let max_attempts = self.settings.max_attempts.max(1);
        let mut delay = self.settings.settle_delay;

        for attempt in 1..=max_attempts {
            sleep(delay).await;

            let response = self
                .api
                .put_file(&self.settings.owner, repo_name, file_name, &request)
                .await
                .map_err(|e| {
                    warn!("GitHub upload failed: {e}");
                    PublishError::Transport(e.to_string())
                })?;

            if response.is_success() {
                info!("📄 Uploaded {file_name} to {}/{repo_name}", self.settings.owner);
                return Ok(());
            }

            if attempt == max_attempts || !response.is_retryable() {
                warn!(
                    "GitHub rejected upload of {file_name} ({}): {}",
                    response.status,
                    response.error_message()
                );
                return Err(PublishError::Upload(response.error_message()));
            }

            debug!(
                "Upload attempt {attempt}/{max_attempts} for {repo_name} returned {}, retrying",
                response.status
            );
            delay *= 2;
        }

        Err(PublishError::Upload("no upload attempts were made".to_string()))
    }
}

#[async_trait]
impl<A: GitHubApi> ScriptPublisher for GitHubPublisher<A> {
    async fn publish(
        &self,
        repo_name: &str,
        file_name: &str,
        content: &str,
    ) -> Result<String, PublishError> {
        self.create_repository(repo_name).await?;
        self.upload_file(repo_name, file_name, content).await?;

        Ok(raw_content_url(
            &self.settings.raw_host,
            &self.settings.owner,
            repo_name,
            &self.settings.branch,
            file_name,
        ))
    }
}
