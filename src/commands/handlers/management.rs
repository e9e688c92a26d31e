//! Server management command handlers
//!
//! Handles: createchannel, delchannel, createrole, delrole, giverole,
//! removerole, nickname, invites, createinvite
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Initial management command set

use async_trait::async_trait;
use log::info;
use serenity::model::id::RoleId;
use serenity::model::permissions::Permissions;

use super::{require_guild, unknown};
use crate::commands::context::CommandContext;
use crate::commands::handler::{Category, CommandError, CommandSpec, OrReply, PrefixCommandHandler};
use crate::commands::invocation::Invocation;
use crate::core::Reply;
use crate::platform::UserRef;

const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("createchannel", Category::Management, "createchannel <name>", "Create a text channel")
        .guild_only()
        .quoting()
        .requires(Permissions::MANAGE_CHANNELS, "manage channels"),
    CommandSpec::new("delchannel", Category::Management, "delchannel [#channel]", "Delete a channel")
        .guild_only()
        .quoting()
        .requires(Permissions::MANAGE_CHANNELS, "manage channels"),
    CommandSpec::new("createrole", Category::Management, "createrole <name>", "Create a role")
        .guild_only()
        .quoting()
        .requires(Permissions::MANAGE_ROLES, "manage roles"),
    CommandSpec::new("delrole", Category::Management, "delrole @role", "Delete a role")
        .guild_only()
        .quoting()
        .requires(Permissions::MANAGE_ROLES, "manage roles"),
    CommandSpec::new("giverole", Category::Management, "giverole @user @role", "Give a member a role")
        .guild_only()
        .quoting()
        .requires(Permissions::MANAGE_ROLES, "manage roles"),
    CommandSpec::new("removerole", Category::Management, "removerole @user @role", "Take a role from a member")
        .guild_only()
        .quoting()
        .requires(Permissions::MANAGE_ROLES, "manage roles"),
    CommandSpec::new("nickname", Category::Management, "nickname @user <nickname>", "Set a member's nickname")
        .guild_only()
        .quoting()
        .requires(Permissions::MANAGE_NICKNAMES, "manage nicknames"),
    CommandSpec::new("invites", Category::Management, "invites", "Count active invites")
        .guild_only()
        .quoting()
        .requires(Permissions::MANAGE_GUILD, "view invites"),
    CommandSpec::new("createinvite", Category::Management, "createinvite", "Create an invite for this channel")
        .guild_only()
        .quoting(),
];

/// Handler for channel, role, nickname and invite management
pub struct ManagementHandler;

#[async_trait]
impl PrefixCommandHandler for ManagementHandler {
    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        match invocation.name.as_str() {
            "createchannel" => self.handle_create_channel(ctx, invocation).await,
            "delchannel" => self.handle_delete_channel(ctx, invocation).await,
            "createrole" => self.handle_create_role(ctx, invocation).await,
            "delrole" => self.handle_delete_role(ctx, invocation).await,
            "giverole" => self.handle_member_role(ctx, invocation, true).await,
            "removerole" => self.handle_member_role(ctx, invocation, false).await,
            "nickname" => self.handle_nickname(ctx, invocation).await,
            "invites" => self.handle_invites(ctx, invocation).await,
            "createinvite" => self.handle_create_invite(ctx, invocation).await,
            other => Err(unknown(other)),
        }
    }
}

impl ManagementHandler {
    async fn handle_create_channel(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let name = invocation.args.join("-").to_lowercase();
        if name.is_empty() {
            return Err(CommandError::usage("Please specify a channel name!"));
        }

        let channel = ctx
            .platform
            .create_channel(guild, &name)
            .await
            .or_reply("Failed to create channel")?;

        info!("Channel {name} created for user {}", invocation.invoker().id);
        Ok(Reply::quote(format!("Created channel <#{channel}>")))
    }

    async fn handle_delete_channel(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let channel = invocation
            .message
            .mentioned_channels()
            .first()
            .copied()
            .unwrap_or(invocation.message.channel_id);

        let name = ctx
            .platform
            .delete_channel(channel)
            .await
            .or_reply("Failed to delete channel")?;

        info!("Channel {channel} deleted for user {}", invocation.invoker().id);
        // The invoking channel may be gone, so confirm privately
        Ok(Reply::direct(format!("Deleted channel {name}")))
    }

    async fn handle_create_role(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let name = invocation.rest(0);
        if name.is_empty() {
            return Err(CommandError::usage("Please specify a role name!"));
        }

        let created = ctx
            .platform
            .create_role(guild, &name)
            .await
            .or_reply("Failed to create role")?;

        Ok(Reply::quote(format!("Created role {created}")))
    }

    async fn handle_delete_role(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let role = invocation
            .message
            .first_mentioned_role()
            .ok_or_else(|| CommandError::usage("Please mention a role!"))?;

        let name = ctx
            .platform
            .delete_role(guild, role)
            .await
            .or_reply("Failed to delete role")?;

        Ok(Reply::quote(format!("Deleted role {name}")))
    }

    async fn handle_member_role(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
        give: bool,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let (member, role) = member_and_role(invocation)?;

        if give {
            ctx.platform
                .add_member_role(guild, member.id, role)
                .await
                .or_reply("Failed to give role")?;
            Ok(Reply::quote(format!("Given <@&{role}> to <@{}>", member.id)))
        } else {
            ctx.platform
                .remove_member_role(guild, member.id, role)
                .await
                .or_reply("Failed to remove role")?;
            Ok(Reply::quote(format!("Removed <@&{role}> from <@{}>", member.id)))
        }
    }

    async fn handle_nickname(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        const HINT: &str = "Please mention a user and provide a nickname!";

        let guild = require_guild(invocation)?;
        let member = invocation
            .message
            .first_mentioned_user()
            .ok_or_else(|| CommandError::usage(HINT))?;
        let nickname = invocation.rest(1);
        if nickname.is_empty() {
            return Err(CommandError::usage(HINT));
        }

        ctx.platform
            .set_nickname(guild, member.id, &nickname)
            .await
            .or_reply("Failed to set nickname")?;

        Ok(Reply::quote(format!(
            "Set <@{}>'s nickname to {nickname}",
            member.id
        )))
    }

    async fn handle_invites(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let guild = require_guild(invocation)?;
        let count = ctx
            .platform
            .count_invites(guild)
            .await
            .or_reply("Failed to fetch invites")?;

        Ok(Reply::quote(format!("Active invites: {count}")))
    }

    async fn handle_create_invite(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let url = ctx
            .platform
            .create_invite(invocation.message.channel_id)
            .await
            .or_reply("Failed to create invite")?;

        Ok(Reply::quote(format!("Created invite: {url}")))
    }
}

fn member_and_role<'a>(invocation: &Invocation<'a>) -> Result<(&'a UserRef, RoleId), CommandError> {
    let message = invocation.message;
    match (message.first_mentioned_user(), message.first_mentioned_role()) {
        (Some(member), Some(role)) => Ok((member, role)),
        _ => Err(CommandError::usage("Please mention both a user and a role!")),
    }
}
