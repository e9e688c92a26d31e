//! # Features
//!
//! Self-contained building blocks used by the command layer.

pub mod cooldown;
pub mod script_hosting;

pub use cooldown::{CooldownCheck, CooldownTracker, DEFAULT_COOLDOWN};
pub use script_hosting::{GitHubClient, GitHubPublisher, PublishError, ScriptPublisher};
