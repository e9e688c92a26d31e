//! # Core Module
//!
//! Configuration, reply payloads and Discord-facing helpers shared by every command.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod config;
pub mod embeds;
pub mod file_utils;
pub mod response;

// Re-export commonly used items
pub use config::{Config, GitHubConfig};
pub use embeds::{EmbedField, EmbedSpec, Reply, ReplyBody, ReplyTarget, INFO_COLOR};
pub use response::{truncate_for_embed, truncate_for_message, EMBED_LIMIT, FIELD_LIMIT, MESSAGE_LIMIT};
