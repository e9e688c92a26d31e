//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 3.0.0: Prefix command handlers grouped by feature area
//! - 1.0.0: Initial extraction from monolithic command handler

pub mod fun;
pub mod info;
pub mod management;
pub mod moderation;
pub mod script;
pub mod utility;
pub mod voice;

use serenity::model::id::GuildId;
use std::sync::Arc;

use super::dispatcher::GUILD_ONLY_MESSAGE;
use super::handler::CommandError;
use super::invocation::Invocation;
use super::registry::CommandRegistry;
use crate::platform::UserRef;

pub use fun::FunHandler;
pub use info::InfoHandler;
pub use management::ManagementHandler;
pub use moderation::ModerationHandler;
pub use script::ScriptHandler;
pub use utility::UtilityHandler;
pub use voice::VoiceHandler;

/// Registry with every built-in command
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(ModerationHandler));
    registry.register(Arc::new(ManagementHandler));
    registry.register(Arc::new(InfoHandler));
    registry.register(Arc::new(UtilityHandler));
    registry.register(Arc::new(ScriptHandler));
    registry.register(Arc::new(FunHandler));
    registry.register(Arc::new(VoiceHandler));
    registry
}

/// Guild of the invoking message; guild-only commands never see a DM
pub(crate) fn require_guild(invocation: &Invocation<'_>) -> Result<GuildId, CommandError> {
    invocation
        .message
        .guild_id
        .ok_or_else(|| CommandError::usage(GUILD_ONLY_MESSAGE))
}

/// First mentioned user, or a usage hint
pub(crate) fn require_user<'a>(
    invocation: &Invocation<'a>,
    hint: &str,
) -> Result<&'a UserRef, CommandError> {
    invocation
        .message
        .first_mentioned_user()
        .ok_or_else(|| CommandError::usage(hint))
}

pub(crate) fn unknown(name: &str) -> CommandError {
    CommandError::usage(format!("Unknown command `{name}`."))
}

/// Run one handler against the mock platform, skipping dispatcher gates
#[cfg(test)]
pub(crate) async fn run_handler(
    handler: &dyn super::handler::PrefixCommandHandler,
    platform: &crate::platform::testing::MockPlatform,
    services: &super::context::Services,
    message: &crate::platform::IncomingMessage,
) -> Result<crate::core::Reply, CommandError> {
    let registry = default_registry();
    let ctx = super::context::CommandContext {
        platform,
        services,
        catalog: registry.catalog(),
    };
    let invocation = Invocation::parse(&services.prefix, message)
        .ok_or_else(|| CommandError::usage("not a command"))?;
    handler.handle(&ctx, &invocation).await
}
