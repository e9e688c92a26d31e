//! Information command handler
//!
//! Handles: info, botinfo, uptime, serverinfo, userinfo, avatar, roleinfo,
//! channelinfo, servericon, members, roles, channels, emojis
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Initial information command set

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::model::id::RoleId;
use std::time::Duration;

use super::{require_guild, unknown};
use crate::commands::context::CommandContext;
use crate::commands::handler::{Category, CommandError, CommandSpec, OrReply, PrefixCommandHandler};
use crate::commands::invocation::Invocation;
use crate::core::response::clip;
use crate::core::{EmbedSpec, Reply, FIELD_LIMIT, INFO_COLOR};

const DATE_FORMAT: &str = "%B %-d, %Y";

const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("info", Category::Information, "info", "Bot name, id and server count"),
    CommandSpec::new("botinfo", Category::Information, "botinfo", "Bot statistics").quoting(),
    CommandSpec::new("uptime", Category::Information, "uptime", "Time since start").quoting(),
    CommandSpec::new("serverinfo", Category::Information, "serverinfo", "About this server").guild_only(),
    CommandSpec::new("userinfo", Category::Information, "userinfo [@user]", "About a member").guild_only(),
    CommandSpec::new("avatar", Category::Information, "avatar [@user]", "Show an avatar"),
    CommandSpec::new("roleinfo", Category::Information, "roleinfo @role|<id>", "About a role").guild_only(),
    CommandSpec::new("channelinfo", Category::Information, "channelinfo [#channel]", "About a channel")
        .guild_only(),
    CommandSpec::new("servericon", Category::Information, "servericon", "Show the server icon")
        .guild_only()
        .quoting(),
    CommandSpec::new("members", Category::Information, "members", "Online and total members")
        .guild_only()
        .quoting(),
    CommandSpec::new("roles", Category::Information, "roles", "List server roles")
        .guild_only()
        .quoting(),
    CommandSpec::new("channels", Category::Information, "channels", "List server channels")
        .guild_only()
        .quoting(),
    CommandSpec::new("emojis", Category::Information, "emojis", "List server emojis")
        .guild_only()
        .quoting(),
];

/// Handler for bot, server, member, role and channel lookups
pub struct InfoHandler;

#[async_trait]
impl PrefixCommandHandler for InfoHandler {
    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        match invocation.name.as_str() {
            "info" => self.handle_info(ctx).await,
            "botinfo" => self.handle_botinfo(ctx).await,
            "uptime" => Ok(Reply::quote(format!("Uptime: {}", format_uptime(ctx.uptime())))),
            "serverinfo" => self.handle_serverinfo(ctx, invocation).await,
            "userinfo" => self.handle_userinfo(ctx, invocation).await,
            "avatar" => self.handle_avatar(ctx, invocation).await,
            "roleinfo" => self.handle_roleinfo(ctx, invocation).await,
            "channelinfo" => self.handle_channelinfo(ctx, invocation).await,
            "servericon" | "members" | "roles" | "channels" | "emojis" => {
                self.handle_guild_listing(ctx, invocation).await
            }
            other => Err(unknown(other)),
        }
    }
}

impl InfoHandler {
    // ── bot ─────────────────────────────────────────────────────────────

    async fn handle_info(&self, ctx: &CommandContext<'_>) -> Result<Reply, CommandError> {
        let bot = ctx
            .platform
            .bot_summary()
            .await
            .or_reply("Failed to fetch bot information.")?;

        Ok(Reply::channel(format!(
            "Bot Name: {}\nBot ID: {}\nTotal Servers: {}",
            bot.tag, bot.id, bot.guild_count
        )))
    }

    async fn handle_botinfo(&self, ctx: &CommandContext<'_>) -> Result<Reply, CommandError> {
        let bot = ctx
            .platform
            .bot_summary()
            .await
            .or_reply("Failed to fetch bot information.")?;

        let embed = EmbedSpec::new("Bot Information")
            .color(INFO_COLOR)
            .field("Servers", bot.guild_count.to_string(), true)
            .field("Users", bot.user_count.to_string(), true)
            .field("Channels", bot.channel_count.to_string(), true)
            .field("Library", "serenity 0.11", true)
            .field("Version", env!("CARGO_PKG_VERSION"), true);
        Ok(Reply::quote_embed(embed))
    }

    // ── server ──────────────────────────────────────────────────────────

    async fn handle_serverinfo(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let summary = ctx
            .platform
            .guild_summary(guild)
            .await
            .or_reply("Failed to fetch server information.")?;

        let embed = EmbedSpec::new(&summary.name)
            .thumbnail(summary.icon_url.clone())
            .color(INFO_COLOR)
            .field("Owner", format!("<@{}>", summary.owner_id), true)
            .field("Members", summary.member_count.to_string(), true)
            .field("Created On", format_date(summary.created_at), true)
            .field("Channels", summary.channel_names.len().to_string(), true)
            .field("Roles", summary.role_names.len().to_string(), true)
            .field("Boosts", summary.boost_count.to_string(), true)
            .footer(format!("Server ID: {}", summary.id));
        Ok(Reply::embed(embed))
    }

    /// servericon, members, roles, channels, emojis: one guild lookup each
    async fn handle_guild_listing(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let summary = ctx
            .platform
            .guild_summary(guild)
            .await
            .or_reply("Failed to fetch server information.")?;

        let reply = match invocation.name.as_str() {
            "servericon" => Reply::quote_embed(
                EmbedSpec::new(&summary.name)
                    .image(summary.icon_url.clone())
                    .color(INFO_COLOR),
            ),
            "members" => Reply::quote(format!(
                "Online: {}\nTotal: {}",
                summary.online_count, summary.member_count
            )),
            "roles" => Reply::quote(format!("Server roles: {}", summary.role_names.join(", "))),
            "channels" => Reply::quote(format!(
                "Server channels: {}",
                summary.channel_names.join(", ")
            )),
            _ => {
                let emojis = summary.emojis.join(" ");
                Reply::quote(format!(
                    "Server emojis: {}",
                    if emojis.is_empty() { "None" } else { &emojis }
                ))
            }
        };
        Ok(reply)
    }

    // ── members ─────────────────────────────────────────────────────────

    async fn handle_userinfo(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let target = invocation.mentioned_or_invoker();
        let member = ctx
            .platform
            .member_summary(guild, target.id)
            .await
            .or_reply("Failed to fetch user information.")?;

        let joined = member
            .joined_at
            .map(format_date)
            .unwrap_or_else(|| "Unknown".to_string());
        let roles = member.role_names.join(", ");

        let embed = EmbedSpec::new(&member.user.tag)
            .thumbnail(Some(member.user.avatar_url.clone()))
            .color(INFO_COLOR)
            .field("Joined Server", joined, true)
            .field("Account Created", format_date(member.user.created_at), true)
            .field("Roles", clip(&roles, FIELD_LIMIT), false)
            .footer(format!("User ID: {}", member.user.id));
        Ok(Reply::embed(embed))
    }

    async fn handle_avatar(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let target = invocation.mentioned_or_invoker();
        let user = ctx
            .platform
            .user_summary(target.id)
            .await
            .or_reply("Failed to fetch user information.")?;

        let embed = EmbedSpec::new(format!("{}'s Avatar", user.tag))
            .image(Some(user.avatar_url))
            .color(INFO_COLOR);
        Ok(Reply::embed(embed))
    }

    // ── roles and channels ──────────────────────────────────────────────

    async fn handle_roleinfo(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        const HINT: &str = "Please mention a role or provide a valid role ID.";

        let guild = require_guild(invocation)?;
        let role_id = invocation
            .message
            .first_mentioned_role()
            .or_else(|| {
                invocation
                    .arg(0)
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .map(RoleId)
            })
            .ok_or_else(|| CommandError::usage(HINT))?;

        let role = ctx
            .platform
            .role_summary(guild, role_id)
            .await
            .or_reply("Failed to fetch role information.")?
            .ok_or_else(|| CommandError::usage(HINT))?;

        let embed = EmbedSpec::new(&role.name)
            .color(role.color)
            .field("Members", role.member_count.to_string(), true)
            .field("Created On", format_date(role.created_at), true)
            .field("Position", role.position.to_string(), true)
            .field("Mentionable", yes_no(role.mentionable), true)
            .footer(format!("Role ID: {}", role.id));
        Ok(Reply::embed(embed))
    }

    async fn handle_channelinfo(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let channel_id = invocation
            .message
            .mentioned_channels()
            .first()
            .copied()
            .unwrap_or(invocation.message.channel_id);
        let channel = ctx
            .platform
            .channel_summary(channel_id)
            .await
            .or_reply("Failed to fetch channel information.")?;

        let embed = EmbedSpec::new(format!("#{}", channel.name))
            .color(INFO_COLOR)
            .field("Type", &channel.kind, true)
            .field("Created On", format_date(channel.created_at), true)
            .field("NSFW", yes_no(channel.nsfw), true)
            .field("Topic", channel.topic.as_deref().unwrap_or("None"), false)
            .footer(format!("Channel ID: {}", channel.id));
        Ok(Reply::embed(embed))
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// `{days}d {hours}h {minutes}m`
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    format!("{days}d {hours}h {minutes}m")
}
