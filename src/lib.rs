// Core layer - shared types and configuration
pub mod core;

// Features layer - cooldowns and script hosting
pub mod features;

// Platform layer - Discord capabilities behind a trait
pub mod platform;

// Application layer
pub mod commands;

// Re-export core config
pub use core::Config;

pub use commands::{default_registry, DispatchOutcome, Dispatcher, Services};
pub use features::{CooldownTracker, GitHubClient, GitHubPublisher, ScriptPublisher};
pub use platform::{Platform, SerenityPlatform};
