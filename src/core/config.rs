//! Environment-driven configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Discord, prefix, cooldown and GitHub script hosting settings

use anyhow::{anyhow, Context, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::features::cooldown::DEFAULT_COOLDOWN;
use crate::features::script_hosting::github::DEFAULT_API_URL;
use crate::features::script_hosting::publisher::{
    DEFAULT_BRANCH, DEFAULT_RAW_HOST, DEFAULT_SETTLE_DELAY, DEFAULT_UPLOAD_ATTEMPTS,
};
use crate::features::script_hosting::PublishSettings;

pub const DEFAULT_PREFIX: &str = ".";

/// GitHub account used for script hosting
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub username: String,
    pub api_url: String,
    pub raw_host: String,
    pub branch: String,
    pub settle_delay: Duration,
    pub upload_attempts: u32,
}

impl GitHubConfig {
    pub fn publish_settings(&self) -> PublishSettings {
        PublishSettings {
            owner: self.username.clone(),
            branch: self.branch.clone(),
            raw_host: self.raw_host.clone(),
            settle_delay: self.settle_delay,
            max_attempts: self.upload_attempts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub command_prefix: String,
    pub default_cooldown: Duration,
    pub log_level: String,
    /// None unless both `GITHUB_TOKEN` and `GITHUB_USERNAME` are set
    pub github: Option<GitHubConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token =
            get("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let command_prefix = get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        if command_prefix.chars().any(char::is_whitespace) {
            return Err(anyhow!("COMMAND_PREFIX must not contain whitespace"));
        }

        let default_cooldown = match get("COMMAND_COOLDOWN_MS") {
            Some(raw) => Duration::from_millis(parse_number("COMMAND_COOLDOWN_MS", &raw)?),
            None => DEFAULT_COOLDOWN,
        };

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let github = match (get("GITHUB_TOKEN"), get("GITHUB_USERNAME")) {
            (Some(token), Some(username)) => Some(GitHubConfig {
                token,
                username,
                api_url: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                raw_host: get("GITHUB_RAW_HOST").unwrap_or_else(|| DEFAULT_RAW_HOST.to_string()),
                branch: get("GITHUB_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                settle_delay: match get("GITHUB_SETTLE_MS") {
                    Some(raw) => Duration::from_millis(parse_number("GITHUB_SETTLE_MS", &raw)?),
                    None => DEFAULT_SETTLE_DELAY,
                },
                upload_attempts: match get("GITHUB_UPLOAD_ATTEMPTS") {
                    Some(raw) => parse_number("GITHUB_UPLOAD_ATTEMPTS", &raw)?,
                    None => DEFAULT_UPLOAD_ATTEMPTS,
                },
            }),
            _ => None,
        };

        Ok(Config {
            discord_token,
            command_prefix,
            default_cooldown,
            log_level,
            github,
        })
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}"))
}
