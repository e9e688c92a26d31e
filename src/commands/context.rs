//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Platform handle, prefix, script publisher and help catalog
//! - 1.0.0: Initial implementation with core shared state

use std::sync::Arc;
use std::time::Instant;

use super::handler::CommandSpec;
use crate::features::ScriptPublisher;
use crate::platform::Platform;

/// Long-lived services shared by every dispatch
#[derive(Clone)]
pub struct Services {
    pub prefix: String,
    pub start_time: Instant,
    /// None when script hosting is not configured
    pub publisher: Option<Arc<dyn ScriptPublisher>>,
}

impl Services {
    pub fn new(prefix: impl Into<String>, publisher: Option<Arc<dyn ScriptPublisher>>) -> Self {
        Self {
            prefix: prefix.into(),
            start_time: Instant::now(),
            publisher,
        }
    }
}

/// What a handler can reach during one dispatch
pub struct CommandContext<'a> {
    pub platform: &'a dyn Platform,
    pub services: &'a Services,
    /// Every registered command, for help
    pub catalog: &'a [&'static CommandSpec],
}

impl<'a> CommandContext<'a> {
    pub fn prefix(&self) -> &str {
        &self.services.prefix
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.services.start_time.elapsed()
    }
}
