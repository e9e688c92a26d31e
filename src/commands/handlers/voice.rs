//! Voice moderation command handlers
//!
//! Handles: voicekick, deafen, undeafen
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Initial voice moderation commands

use async_trait::async_trait;
use log::info;
use serenity::model::permissions::Permissions;

use super::{require_guild, require_user, unknown};
use crate::commands::context::CommandContext;
use crate::commands::handler::{Category, CommandError, CommandSpec, OrReply, PrefixCommandHandler};
use crate::commands::invocation::Invocation;
use crate::core::Reply;

const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("voicekick", Category::Voice, "voicekick @user", "Disconnect a member from voice")
        .guild_only()
        .quoting()
        .requires(Permissions::MOVE_MEMBERS, "move members"),
    CommandSpec::new("deafen", Category::Voice, "deafen @user", "Server-deafen a member")
        .guild_only()
        .quoting()
        .requires(Permissions::DEAFEN_MEMBERS, "deafen members"),
    CommandSpec::new("undeafen", Category::Voice, "undeafen @user", "Undo deafen")
        .guild_only()
        .quoting()
        .requires(Permissions::DEAFEN_MEMBERS, "deafen members"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceAction {
    Disconnect,
    Deafen,
    Undeafen,
}

impl VoiceAction {
    fn failure(self) -> &'static str {
        match self {
            Self::Disconnect => "Failed to disconnect user",
            Self::Deafen => "Failed to deafen user",
            Self::Undeafen => "Failed to undeafen user",
        }
    }

    fn success(self, mention: &str) -> String {
        match self {
            Self::Disconnect => format!("Disconnected {mention} from voice"),
            Self::Deafen => format!("Deafened {mention}"),
            Self::Undeafen => format!("Undeafened {mention}"),
        }
    }
}

/// Handler for voice channel moderation
pub struct VoiceHandler;

#[async_trait]
impl PrefixCommandHandler for VoiceHandler {
    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let action = match invocation.name.as_str() {
            "voicekick" => VoiceAction::Disconnect,
            "deafen" => VoiceAction::Deafen,
            "undeafen" => VoiceAction::Undeafen,
            other => return Err(unknown(other)),
        };

        let guild = require_guild(invocation)?;
        let target = require_user(invocation, "Please mention a user in a voice channel!")?;

        let connected = ctx
            .platform
            .voice_channel(guild, target.id)
            .await
            .or_reply(action.failure())?;
        if connected.is_none() {
            return Err(CommandError::usage("User is not in a voice channel!"));
        }

        let result = match action {
            VoiceAction::Disconnect => ctx.platform.disconnect_voice(guild, target.id).await,
            VoiceAction::Deafen => ctx.platform.set_deafened(guild, target.id, true).await,
            VoiceAction::Undeafen => ctx.platform.set_deafened(guild, target.id, false).await,
        };
        result.or_reply(action.failure())?;

        info!("{action:?} of {} completed for user {}", target.id, invocation.invoker().id);
        Ok(Reply::quote(action.success(&format!("<@{}>", target.id))))
    }
}
