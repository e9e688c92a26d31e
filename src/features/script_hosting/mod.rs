//! # Feature: Script Hosting
//!
//! Publishes a user-submitted script to a fresh GitHub repository and hands
//! back the raw-content URL for it.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true (disabled unless GitHub credentials are configured)

pub mod github;
pub mod publisher;

pub use github::{ApiResponse, CreateRepoRequest, GitHubApi, GitHubClient, PutFileRequest};
pub use publisher::{
    raw_content_url, GitHubPublisher, PublishError, PublishSettings, ScriptPublisher,
};
