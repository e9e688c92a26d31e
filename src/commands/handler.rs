//! Prefix command handler trait and command descriptors
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Static descriptors carry permission, scope, reply style and cooldown
//! - 1.0.0: Initial implementation for modular command handling

use async_trait::async_trait;
use serenity::model::permissions::Permissions;
use std::time::Duration;
use thiserror::Error;

use super::context::CommandContext;
use super::invocation::Invocation;
use crate::core::{Reply, ReplyTarget};

/// Help section a command is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Moderation,
    Management,
    Information,
    Utility,
    Fun,
    Voice,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Moderation,
        Category::Management,
        Category::Information,
        Category::Utility,
        Category::Fun,
        Category::Voice,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::Moderation => "Moderation",
            Category::Management => "Server Management",
            Category::Information => "Information",
            Category::Utility => "Utility",
            Category::Fun => "Fun",
            Category::Voice => "Voice Moderation",
        }
    }
}

/// Where a command may be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Anywhere,
    GuildOnly,
    DirectOnly,
}

/// Capability the invoker needs, and how a denial names it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredPermission {
    pub permissions: Permissions,
    /// Completes "You do not have permission to ..."
    pub noun: &'static str,
}

/// Static description of one command name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub scope: Scope,
    pub permission: Option<RequiredPermission>,
    /// How rejections and usage hints are delivered
    pub replies: ReplyTarget,
    /// Overrides the dispatcher's default window
    pub cooldown: Option<Duration>,
}

impl CommandSpec {
    pub const fn new(
        name: &'static str,
        category: Category,
        usage: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            usage,
            description,
            category,
            scope: Scope::Anywhere,
            permission: None,
            replies: ReplyTarget::Channel,
            cooldown: None,
        }
    }

    pub const fn guild_only(mut self) -> Self {
        self.scope = Scope::GuildOnly;
        self
    }

    pub const fn direct_only(mut self) -> Self {
        self.scope = Scope::DirectOnly;
        self
    }

    pub const fn requires(mut self, permissions: Permissions, noun: &'static str) -> Self {
        self.permission = Some(RequiredPermission { permissions, noun });
        self
    }

    /// Deliver rejections as replies to the invoking message
    pub const fn quoting(mut self) -> Self {
        self.replies = ReplyTarget::Quote;
        self
    }

    pub const fn cooldown(mut self, window: Duration) -> Self {
        self.cooldown = Some(window);
        self
    }

    /// Reply with `text` the way this command delivers rejections
    pub fn respond(&self, text: impl AsRef<str>) -> Reply {
        match self.replies {
            ReplyTarget::Quote => Reply::quote(text),
            _ => Reply::channel(text),
        }
    }
}

/// Why a handler produced no success reply
#[derive(Debug, Error)]
pub enum CommandError {
    /// Arguments did not have the expected shape; the text is a hint
    #[error("{0}")]
    Usage(String),

    /// The external action failed; `message` is shown, `cause` is logged
    #[error("{message}")]
    Action {
        message: String,
        #[source]
        cause: anyhow::Error,
    },
}

impl CommandError {
    pub fn usage(hint: impl Into<String>) -> Self {
        Self::Usage(hint.into())
    }

    pub fn action(message: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::Action {
            message: message.into(),
            cause,
        }
    }

    /// Text the invoker sees
    pub fn user_message(&self) -> &str {
        match self {
            Self::Usage(hint) => hint,
            Self::Action { message, .. } => message,
        }
    }
}

/// Convert an external-action failure into a user-visible message
pub trait OrReply<T> {
    fn or_reply(self, message: &str) -> Result<T, CommandError>;
}

impl<T> OrReply<T> for anyhow::Result<T> {
    fn or_reply(self, message: &str) -> Result<T, CommandError> {
        self.map_err(|cause| CommandError::action(message, cause))
    }
}

/// Trait for prefix command handlers
///
/// A handler owns one or more command names, usually a feature area. The
/// dispatcher has already applied cooldown, scope and permission checks by
/// the time `handle` runs.
///
/// # Example
///
/// ```ignore
/// pub struct PingHandler;
///
/// const COMMANDS: &[CommandSpec] = &[CommandSpec::new("ping", Category::Utility, "ping", "Latency")];
///
/// #[async_trait]
/// impl PrefixCommandHandler for PingHandler {
///     fn commands(&self) -> &'static [CommandSpec] {
///         COMMANDS
///     }
///
///     async fn handle(&self, ctx: &CommandContext<'_>, inv: &Invocation<'_>) -> Result<Reply, CommandError> {
///         Ok(Reply::channel("Pong!"))
///     }
/// }
/// ```
#[async_trait]
pub trait PrefixCommandHandler: Send + Sync {
    /// Commands this handler processes
    fn commands(&self) -> &'static [CommandSpec];

    /// Run the command and describe the reply
    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError>;
}
