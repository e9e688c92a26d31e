//! Moderation command handlers
//!
//! Handles: kick, ban, purge, mute/timeout, unmute, warn, slowmode, lock,
//! unlock, unban, banlist
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Initial moderation command set

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use serenity::model::id::UserId;
use serenity::model::permissions::Permissions;

use super::{require_guild, require_user, unknown};
use crate::commands::context::CommandContext;
use crate::commands::handler::{Category, CommandError, CommandSpec, OrReply, PrefixCommandHandler};
use crate::commands::invocation::Invocation;
use crate::core::response::clip_with_ellipsis;
use crate::core::{Reply, ReplyBody};

const DEFAULT_MUTE_MINUTES: i64 = 5;
/// Discord caps timeouts at 28 days
const MAX_MUTE_MINUTES: i64 = 28 * 24 * 60;
const MAX_PURGE: u64 = 100;
const MAX_SLOWMODE_SECS: u64 = 21600;
const BAN_LIST_LIMIT: usize = 1900;
const NO_REASON: &str = "No reason provided";

const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("kick", Category::Moderation, "kick @user", "Kick a member")
        .guild_only()
        .requires(Permissions::KICK_MEMBERS, "kick members"),
    CommandSpec::new("ban", Category::Moderation, "ban @user", "Ban a member")
        .guild_only()
        .requires(Permissions::BAN_MEMBERS, "ban members"),
    CommandSpec::new("purge", Category::Moderation, "purge <1-100>", "Bulk delete recent messages")
        .guild_only()
        .requires(Permissions::MANAGE_MESSAGES, "purge messages"),
    CommandSpec::new("mute", Category::Moderation, "mute @user [minutes] [reason]", "Time out a member")
        .guild_only()
        .requires(Permissions::MODERATE_MEMBERS, "mute members"),
    CommandSpec::new("timeout", Category::Moderation, "timeout @user [minutes] [reason]", "Alias of mute")
        .guild_only()
        .requires(Permissions::MODERATE_MEMBERS, "mute members"),
    CommandSpec::new("unmute", Category::Moderation, "unmute @user", "Remove a timeout")
        .guild_only()
        .requires(Permissions::MODERATE_MEMBERS, "unmute members"),
    CommandSpec::new("warn", Category::Moderation, "warn @user [reason]", "Warn a member by DM")
        .guild_only()
        .requires(Permissions::MANAGE_MESSAGES, "warn members"),
    CommandSpec::new("slowmode", Category::Moderation, "slowmode <0-21600>", "Set channel slowmode")
        .guild_only()
        .requires(Permissions::MANAGE_CHANNELS, "change slowmode settings"),
    CommandSpec::new("lock", Category::Moderation, "lock", "Stop @everyone from sending messages")
        .guild_only()
        .requires(Permissions::MANAGE_CHANNELS, "lock channels"),
    CommandSpec::new("unlock", Category::Moderation, "unlock", "Undo lock")
        .guild_only()
        .requires(Permissions::MANAGE_CHANNELS, "unlock channels"),
    CommandSpec::new("unban", Category::Moderation, "unban <user id>", "Lift a ban")
        .guild_only()
        .requires(Permissions::BAN_MEMBERS, "unban members"),
    CommandSpec::new("banlist", Category::Moderation, "banlist", "List banned users")
        .guild_only()
        .requires(Permissions::BAN_MEMBERS, "view the ban list"),
];

/// Handler for member and channel moderation
pub struct ModerationHandler;

#[async_trait]
impl PrefixCommandHandler for ModerationHandler {
    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        match invocation.name.as_str() {
            "kick" => self.handle_kick(ctx, invocation).await,
            "ban" => self.handle_ban(ctx, invocation).await,
            "purge" => self.handle_purge(ctx, invocation).await,
            "mute" | "timeout" => self.handle_mute(ctx, invocation).await,
            "unmute" => self.handle_unmute(ctx, invocation).await,
            "warn" => self.handle_warn(ctx, invocation).await,
            "slowmode" => self.handle_slowmode(ctx, invocation).await,
            "lock" => self.handle_lock(ctx, invocation, true).await,
            "unlock" => self.handle_lock(ctx, invocation, false).await,
            "unban" => self.handle_unban(ctx, invocation).await,
            "banlist" => self.handle_banlist(ctx, invocation).await,
            other => Err(unknown(other)),
        }
    }
}

impl ModerationHandler {
    async fn handle_kick(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let target = require_user(invocation, "Please mention a user to kick.")?;

        ctx.platform
            .kick_member(guild, target.id)
            .await
            .or_reply("I was unable to kick the user.")?;

        info!("Kick of {} completed for user {}", target.id, invocation.invoker().id);
        Ok(Reply::channel(format!("{} has been kicked.", target.tag)))
    }

    async fn handle_ban(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let target = require_user(invocation, "Please mention a user to ban.")?;

        ctx.platform
            .ban_member(guild, target.id)
            .await
            .or_reply("I was unable to ban the user.")?;

        info!("Ban of {} completed for user {}", target.id, invocation.invoker().id);
        Ok(Reply::channel(format!("{} has been banned.", target.tag)))
    }

    async fn handle_purge(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let count = invocation
            .arg(0)
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|n| (1..=MAX_PURGE).contains(n))
            .ok_or_else(|| {
                CommandError::usage("Please provide a number between 1 and 100 to delete.")
            })?;

        // One extra for the command message itself
        let deleted = ctx
            .platform
            .purge_messages(invocation.message.channel_id, count + 1)
            .await
            .or_reply("There was an error trying to purge messages.")?;

        Ok(Reply::channel(format!(
            "{} message(s) have been deleted.",
            deleted.saturating_sub(1)
        )))
    }

    async fn handle_mute(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let target = require_user(invocation, "Please mention a user to mute.")?;
        let minutes = parse_mute_minutes(invocation.arg(1))?;
        let reason = non_empty_or(invocation.rest(2), NO_REASON);
        let until = Utc::now() + chrono::Duration::minutes(minutes);

        ctx.platform
            .timeout_member(guild, target.id, until, &reason)
            .await
            .or_reply("I was unable to mute the user.")?;

        info!("Mute of {} for {minutes}m completed for user {}", target.id, invocation.invoker().id);
        Ok(Reply::channel(format!(
            "{} has been muted for {minutes} minutes.",
            target.tag
        )))
    }

    async fn handle_unmute(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let target = require_user(invocation, "Please mention a user to unmute.")?;

        ctx.platform
            .remove_timeout(guild, target.id)
            .await
            .or_reply("I was unable to unmute the user.")?;

        Ok(Reply::channel(format!("{} has been unmuted.", target.tag)))
    }

    async fn handle_warn(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let target = require_user(invocation, "Please mention a user to warn.")?;
        let reason = non_empty_or(invocation.rest(1), NO_REASON);

        let guild_name = match ctx.platform.guild_summary(guild).await {
            Ok(summary) => summary.name,
            Err(e) => {
                warn!("Could not look up guild {guild} for warning: {e:#}");
                "this server".to_string()
            }
        };

        let mut text = format!("{} has been warned for: {reason}", target.tag);
        let notice = ReplyBody::Text(format!("You have been warned in {guild_name} for: {reason}"));
        if let Err(e) = ctx.platform.send_direct(target.id, &notice).await {
            warn!("Could not DM warning to {}: {e:#}", target.id);
            text.push_str("\nCouldn't DM the user about their warning.");
        }

        Ok(Reply::channel(text))
    }

    async fn handle_slowmode(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let seconds = invocation
            .arg(0)
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs <= MAX_SLOWMODE_SECS)
            .ok_or_else(|| {
                CommandError::usage(
                    "Please provide a valid number of seconds between 0 and 21600 (6 hours).",
                )
            })?;

        ctx.platform
            .set_slowmode(invocation.message.channel_id, seconds)
            .await
            .or_reply("Failed to set slowmode.")?;

        Ok(Reply::channel(format!("Slowmode set to {seconds} seconds.")))
    }

    async fn handle_lock(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
        locked: bool,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let (done, failed) = if locked {
            ("Channel locked.", "Failed to lock the channel.")
        } else {
            ("Channel unlocked.", "Failed to unlock the channel.")
        };

        ctx.platform
            .set_channel_locked(guild, invocation.message.channel_id, locked)
            .await
            .or_reply(failed)?;

        Ok(Reply::channel(done))
    }

    async fn handle_unban(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        const FAILED: &str = "I was unable to unban the user. Check if the ID is correct.";

        let guild = require_guild(invocation)?;
        let raw = invocation
            .arg(0)
            .ok_or_else(|| CommandError::usage("Please provide a user ID to unban."))?;
        let user_id = raw
            .parse::<u64>()
            .map(UserId)
            .map_err(|e| CommandError::action(FAILED, e.into()))?;

        ctx.platform
            .unban_user(guild, user_id)
            .await
            .or_reply(FAILED)?;

        Ok(Reply::channel(format!("User with ID {raw} has been unbanned.")))
    }

    async fn handle_banlist(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let bans = ctx
            .platform
            .list_bans(guild)
            .await
            .or_reply("Failed to fetch ban list.")?;

        if bans.is_empty() {
            return Ok(Reply::channel("There are no banned users in this server."));
        }

        let listing = bans
            .iter()
            .map(|ban| {
                format!(
                    "{} ({}): {}",
                    ban.user.tag,
                    ban.user.id,
                    ban.reason.as_deref().unwrap_or(NO_REASON)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Reply::channel(format!(
            "**Banned Users:**\n{}",
            clip_with_ellipsis(&listing, BAN_LIST_LIMIT)
        )))
    }
}

fn parse_mute_minutes(raw: Option<&str>) -> Result<i64, CommandError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MUTE_MINUTES);
    };
    raw.parse::<i64>()
        .ok()
        .filter(|m| (1..=MAX_MUTE_MINUTES).contains(m))
        .ok_or_else(|| {
            CommandError::usage(format!(
                "Please provide a duration between 1 and {MAX_MUTE_MINUTES} minutes."
            ))
        })
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}
