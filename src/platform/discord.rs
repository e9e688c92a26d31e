//! Serenity-backed [`Platform`] implementation
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Moderation, management, lookup and reply calls over serenity's HTTP client and cache

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serenity::builder::CreateMessage;
use serenity::client::bridge::gateway::{ShardId, ShardManager};
use serenity::model::channel::{
    Channel, ChannelType, Message, PermissionOverwrite, PermissionOverwriteType, ReactionType,
};
use serenity::model::guild::Role;
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use serenity::model::timestamp::Timestamp;
use serenity::model::user::OnlineStatus;
use serenity::prelude::{Context, Mutex, TypeMapKey};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{
    AttachmentRef, BanEntry, BotSummary, ChannelSummary, GuildSummary, IncomingMessage,
    MemberSummary, Platform, RoleSummary, UserRef, UserSummary,
};
use crate::core::file_utils::{download_bytes, DEFAULT_DOWNLOAD_TIMEOUT_SECS, SCRIPT_ATTACHMENT_LIMIT};
use crate::core::ReplyBody;

/// Discord refuses to bulk-delete messages older than this
const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;
/// Discord's per-request bulk-delete cap
const BULK_DELETE_MAX: u64 = 100;

/// Type map slot for the shard manager, used to read gateway latency
pub struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<Mutex<ShardManager>>;
}

fn to_utc(timestamp: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_else(Utc::now)
}

fn fill_message<'a, 'b>(
    m: &'b mut CreateMessage<'a>,
    body: &ReplyBody,
) -> &'b mut CreateMessage<'a> {
    match body {
        ReplyBody::Text(text) => m.content(text),
        ReplyBody::Embed(spec) => m.set_embed(spec.to_create_embed()),
    }
}

/// Guild-level permissions from the owner flag, the guild's role table and
/// the member's roles. The guild id doubles as the `@everyone` role id.
pub(crate) fn resolve_permissions(
    guild_id: GuildId,
    is_owner: bool,
    role_permissions: &HashMap<RoleId, Permissions>,
    member_roles: &[RoleId],
) -> Permissions {
    if is_owner {
        return Permissions::all();
    }

    let everyone = role_permissions
        .get(&RoleId(guild_id.0))
        .copied()
        .unwrap_or_else(Permissions::empty);
    let granted = member_roles
        .iter()
        .filter_map(|role| role_permissions.get(role))
        .fold(everyone, |acc, permissions| acc | *permissions);

    if granted.contains(Permissions::ADMINISTRATOR) {
        Permissions::all()
    } else {
        granted
    }
}

/// Owner and role permission table, from the cache or over HTTP on a miss
async fn permission_table(
    ctx: &Context,
    guild_id: GuildId,
) -> Result<(UserId, HashMap<RoleId, Permissions>)> {
    if let Some(guild) = ctx.cache.guild(guild_id) {
        let roles = guild.roles.iter().map(|(id, role)| (*id, role.permissions)).collect();
        return Ok((guild.owner_id, roles));
    }

    warn!("Guild {guild_id} is not cached yet, fetching roles over HTTP");
    let partial = guild_id.to_partial_guild(&ctx.http).await?;
    let roles = partial.roles.iter().map(|(id, role)| (*id, role.permissions)).collect();
    Ok((partial.owner_id, roles))
}

/// Guild-level permissions of the message author. Lookup failures deny.
async fn author_permissions(ctx: &Context, guild_id: GuildId, msg: &Message) -> Permissions {
    let (owner_id, role_permissions) = match permission_table(ctx, guild_id).await {
        Ok(table) => table,
        Err(e) => {
            warn!("Could not load roles for guild {guild_id}: {e}");
            return Permissions::empty();
        }
    };

    match msg.member(ctx).await {
        Ok(member) => resolve_permissions(
            guild_id,
            owner_id == msg.author.id,
            &role_permissions,
            &member.roles,
        ),
        Err(e) => {
            warn!("Could not resolve member {} in guild {guild_id}: {e}", msg.author.id);
            Permissions::empty()
        }
    }
}

/// Capture what dispatch needs from a serenity message
pub async fn incoming_message(ctx: &Context, msg: &Message) -> IncomingMessage {
    let permissions = match msg.guild_id {
        Some(guild_id) => Some(author_permissions(ctx, guild_id, msg).await),
        None => None,
    };

    IncomingMessage {
        message_id: msg.id,
        channel_id: msg.channel_id,
        guild_id: msg.guild_id,
        author: UserRef {
            id: msg.author.id,
            tag: msg.author.tag(),
        },
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        permissions,
        mentioned_users: msg
            .mentions
            .iter()
            .map(|user| UserRef {
                id: user.id,
                tag: user.tag(),
            })
            .collect(),
        mentioned_roles: msg.mention_roles.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentRef {
                filename: a.filename.clone(),
                url: a.url.clone(),
                size: a.size,
            })
            .collect(),
    }
}

/// Platform adapter bound to one event's serenity context
pub struct SerenityPlatform {
    ctx: Context,
}

impl SerenityPlatform {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    async fn guild_roles(&self, guild: GuildId) -> Result<HashMap<RoleId, Role>> {
        match self.ctx.cache.guild(guild) {
            Some(cached) => Ok(cached.roles),
            None => Ok(guild.roles(&self.ctx.http).await?),
        }
    }

    async fn everyone_overwrite(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> Result<Option<PermissionOverwrite>> {
        let everyone = PermissionOverwriteType::Role(RoleId(guild.0));
        match channel.to_channel(&self.ctx).await? {
            Channel::Guild(guild_channel) => Ok(guild_channel
                .permission_overwrites
                .into_iter()
                .find(|overwrite| overwrite.kind == everyone)),
            _ => Err(anyhow!("channel {channel} is not a guild channel")),
        }
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    async fn send_message(
        &self,
        channel: ChannelId,
        body: &ReplyBody,
        reference: Option<MessageId>,
    ) -> Result<MessageId> {
        let sent = channel
            .send_message(&self.ctx.http, |m| {
                fill_message(m, body);
                if let Some(message_id) = reference {
                    m.reference_message((channel, message_id));
                }
                m
            })
            .await?;
        Ok(sent.id)
    }

    async fn send_direct(&self, user: UserId, body: &ReplyBody) -> Result<(ChannelId, MessageId)> {
        let dm = user.create_dm_channel(&self.ctx).await?;
        let sent = dm
            .send_message(&self.ctx.http, |m| fill_message(m, body))
            .await?;
        Ok((dm.id, sent.id))
    }

    async fn add_reaction(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        channel
            .create_reaction(&self.ctx.http, message, ReactionType::Unicode(emoji.to_string()))
            .await?;
        Ok(())
    }

    async fn purge_messages(&self, channel: ChannelId, count: u64) -> Result<usize> {
        let limit = count.min(BULK_DELETE_MAX);
        let messages = channel
            .messages(&self.ctx.http, |request| request.limit(limit))
            .await?;

        let cutoff = Utc::now().timestamp() - BULK_DELETE_MAX_AGE_SECS;
        let ids: Vec<MessageId> = messages
            .iter()
            .filter(|message| message.timestamp.unix_timestamp() > cutoff)
            .map(|message| message.id)
            .collect();

        match ids.as_slice() {
            [] => {}
            [single] => channel.delete_message(&self.ctx.http, *single).await?,
            many => channel.delete_messages(&self.ctx.http, many).await?,
        }

        debug!("Purged {} message(s) from channel {channel}", ids.len());
        Ok(ids.len())
    }

    async fn download_attachment(&self, url: &str) -> Result<Vec<u8>> {
        download_bytes(url, SCRIPT_ATTACHMENT_LIMIT, DEFAULT_DOWNLOAD_TIMEOUT_SECS).await
    }

    async fn kick_member(&self, guild: GuildId, user: UserId) -> Result<()> {
        guild.kick(&self.ctx.http, user).await?;
        Ok(())
    }

    async fn ban_member(&self, guild: GuildId, user: UserId) -> Result<()> {
        guild.ban(&self.ctx.http, user, 0).await?;
        Ok(())
    }

    async fn unban_user(&self, guild: GuildId, user: UserId) -> Result<()> {
        guild.unban(&self.ctx.http, user).await?;
        Ok(())
    }

    async fn list_bans(&self, guild: GuildId) -> Result<Vec<BanEntry>> {
        let bans = guild.bans(&self.ctx.http).await?;
        Ok(bans
            .into_iter()
            .map(|ban| BanEntry {
                user: UserRef {
                    id: ban.user.id,
                    tag: ban.user.tag(),
                },
                reason: ban.reason,
            })
            .collect())
    }

    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<()> {
        debug!("Timing out {user} in {guild} until {until}: {reason}");
        guild
            .edit_member(&self.ctx.http, user, |m| {
                m.disable_communication_until(until.to_rfc3339())
            })
            .await?;
        Ok(())
    }

    async fn remove_timeout(&self, guild: GuildId, user: UserId) -> Result<()> {
        guild
            .edit_member(&self.ctx.http, user, |m| m.enable_communication())
            .await?;
        Ok(())
    }

    async fn set_nickname(&self, guild: GuildId, user: UserId, nickname: &str) -> Result<()> {
        guild
            .edit_member(&self.ctx.http, user, |m| m.nickname(nickname))
            .await?;
        Ok(())
    }

    async fn add_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        let mut member = guild.member(&self.ctx, user).await?;
        member.add_role(&self.ctx.http, role).await?;
        Ok(())
    }

    async fn remove_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        let mut member = guild.member(&self.ctx, user).await?;
        member.remove_role(&self.ctx.http, role).await?;
        Ok(())
    }

    async fn voice_channel(&self, guild: GuildId, user: UserId) -> Result<Option<ChannelId>> {
        let cached = self
            .ctx
            .cache
            .guild(guild)
            .ok_or_else(|| anyhow!("guild {guild} is not cached"))?;
        Ok(cached
            .voice_states
            .get(&user)
            .and_then(|state| state.channel_id))
    }

    async fn disconnect_voice(&self, guild: GuildId, user: UserId) -> Result<()> {
        guild
            .edit_member(&self.ctx.http, user, |m| m.disconnect_member())
            .await?;
        Ok(())
    }

    async fn set_deafened(&self, guild: GuildId, user: UserId, deafened: bool) -> Result<()> {
        guild
            .edit_member(&self.ctx.http, user, |m| m.deafen(deafened))
            .await?;
        Ok(())
    }

    async fn set_slowmode(&self, channel: ChannelId, seconds: u64) -> Result<()> {
        channel
            .edit(&self.ctx.http, |c| c.rate_limit_per_user(seconds))
            .await?;
        Ok(())
    }

    async fn set_channel_locked(
        &self,
        guild: GuildId,
        channel: ChannelId,
        locked: bool,
    ) -> Result<()> {
        let (mut allow, mut deny) = self
            .everyone_overwrite(guild, channel)
            .await?
            .map(|overwrite| (overwrite.allow, overwrite.deny))
            .unwrap_or((Permissions::empty(), Permissions::empty()));

        allow.remove(Permissions::SEND_MESSAGES);
        if locked {
            deny.insert(Permissions::SEND_MESSAGES);
        } else {
            deny.remove(Permissions::SEND_MESSAGES);
        }

        channel
            .create_permission(
                &self.ctx.http,
                &PermissionOverwrite {
                    allow,
                    deny,
                    kind: PermissionOverwriteType::Role(RoleId(guild.0)),
                },
            )
            .await?;
        Ok(())
    }

    async fn create_channel(&self, guild: GuildId, name: &str) -> Result<ChannelId> {
        let channel = guild
            .create_channel(&self.ctx.http, |c| c.name(name).kind(ChannelType::Text))
            .await?;
        Ok(channel.id)
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<String> {
        let deleted = channel.delete(&self.ctx.http).await?;
        Ok(match deleted {
            Channel::Guild(guild_channel) => guild_channel.name,
            Channel::Category(category) => category.name,
            other => other.id().to_string(),
        })
    }

    async fn create_role(&self, guild: GuildId, name: &str) -> Result<String> {
        let role = guild.create_role(&self.ctx.http, |r| r.name(name)).await?;
        Ok(role.name)
    }

    async fn delete_role(&self, guild: GuildId, role: RoleId) -> Result<String> {
        let name = self
            .guild_roles(guild)
            .await?
            .remove(&role)
            .map(|r| r.name)
            .ok_or_else(|| anyhow!("role {role} does not exist in guild {guild}"))?;
        guild.delete_role(&self.ctx.http, role).await?;
        Ok(name)
    }

    async fn create_invite(&self, channel: ChannelId) -> Result<String> {
        let invite = channel.create_invite(&self.ctx.http, |i| i).await?;
        Ok(invite.url())
    }

    async fn count_invites(&self, guild: GuildId) -> Result<usize> {
        Ok(guild.invites(&self.ctx.http).await?.len())
    }

    async fn gateway_latency(&self) -> Option<Duration> {
        let manager = {
            let data = self.ctx.data.read().await;
            data.get::<ShardManagerContainer>()?.clone()
        };
        let manager = manager.lock().await;
        let runners = manager.runners.lock().await;
        runners
            .get(&ShardId(self.ctx.shard_id))
            .and_then(|runner| runner.latency)
    }

    async fn bot_summary(&self) -> Result<BotSummary> {
        let current = self.ctx.cache.current_user();
        Ok(BotSummary {
            id: current.id,
            tag: current.tag(),
            guild_count: self.ctx.cache.guild_count(),
            user_count: self.ctx.cache.user_count(),
            channel_count: self.ctx.cache.guild_channel_count(),
        })
    }

    async fn guild_summary(&self, guild: GuildId) -> Result<GuildSummary> {
        let cached = self
            .ctx
            .cache
            .guild(guild)
            .ok_or_else(|| anyhow!("guild {guild} is not cached"))?;

        let mut roles: Vec<&Role> = cached.roles.values().collect();
        roles.sort_by(|a, b| b.position.cmp(&a.position));

        let channel_names = cached
            .channels
            .values()
            .filter_map(|channel| match channel {
                Channel::Guild(guild_channel) => Some(guild_channel.name.clone()),
                Channel::Category(category) => Some(category.name.clone()),
                _ => None,
            })
            .collect();

        Ok(GuildSummary {
            id: cached.id,
            name: cached.name.clone(),
            owner_id: cached.owner_id,
            created_at: to_utc(cached.id.created_at()),
            member_count: cached.member_count,
            online_count: cached
                .presences
                .values()
                .filter(|presence| presence.status == OnlineStatus::Online)
                .count(),
            boost_count: cached.premium_subscription_count,
            icon_url: cached.icon_url(),
            channel_names,
            role_names: roles.iter().map(|role| role.name.clone()).collect(),
            emojis: cached.emojis.values().map(|emoji| emoji.to_string()).collect(),
        })
    }

    async fn user_summary(&self, user: UserId) -> Result<UserSummary> {
        let fetched = user.to_user(&self.ctx).await?;
        Ok(UserSummary {
            id: fetched.id,
            tag: fetched.tag(),
            avatar_url: fetched.face(),
            created_at: to_utc(fetched.id.created_at()),
        })
    }

    async fn member_summary(&self, guild: GuildId, user: UserId) -> Result<MemberSummary> {
        let member = guild.member(&self.ctx, user).await?;
        let roles = self.guild_roles(guild).await?;

        Ok(MemberSummary {
            user: UserSummary {
                id: member.user.id,
                tag: member.user.tag(),
                avatar_url: member.user.face(),
                created_at: to_utc(member.user.id.created_at()),
            },
            joined_at: member.joined_at.map(to_utc),
            role_names: member
                .roles
                .iter()
                .filter_map(|role_id| roles.get(role_id).map(|role| role.name.clone()))
                .collect(),
        })
    }

    async fn role_summary(&self, guild: GuildId, role: RoleId) -> Result<Option<RoleSummary>> {
        let roles = self.guild_roles(guild).await?;
        let Some(found) = roles.get(&role) else {
            return Ok(None);
        };

        let member_count = self
            .ctx
            .cache
            .guild(guild)
            .map(|cached| {
                cached
                    .members
                    .values()
                    .filter(|member| member.roles.contains(&role))
                    .count()
            })
            .unwrap_or(0);

        Ok(Some(RoleSummary {
            id: found.id,
            name: found.name.clone(),
            color: found.colour.0,
            created_at: to_utc(found.id.created_at()),
            position: found.position,
            mentionable: found.mentionable,
            member_count,
        }))
    }

    async fn channel_summary(&self, channel: ChannelId) -> Result<ChannelSummary> {
        match channel.to_channel(&self.ctx).await? {
            Channel::Guild(guild_channel) => Ok(ChannelSummary {
                id: guild_channel.id,
                name: guild_channel.name.clone(),
                kind: guild_channel.kind.name().to_string(),
                created_at: to_utc(guild_channel.id.created_at()),
                nsfw: guild_channel.nsfw,
                topic: guild_channel.topic.clone(),
            }),
            _ => Err(anyhow!("channel {channel} is not a guild channel")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = GuildId(100);
    const MODS: RoleId = RoleId(10);
    const ADMINS: RoleId = RoleId(11);

    fn role_table() -> HashMap<RoleId, Permissions> {
        HashMap::from([
            (RoleId(GUILD.0), Permissions::SEND_MESSAGES),
            (MODS, Permissions::KICK_MEMBERS | Permissions::MANAGE_MESSAGES),
            (ADMINS, Permissions::ADMINISTRATOR),
        ])
    }

    #[test]
    fn test_everyone_role_applies_without_member_roles() {
        let permissions = resolve_permissions(GUILD, false, &role_table(), &[]);
        assert_eq!(permissions, Permissions::SEND_MESSAGES);
    }

    #[test]
    fn test_member_roles_are_unioned() {
        let permissions = resolve_permissions(GUILD, false, &role_table(), &[MODS]);

        assert!(permissions.contains(Permissions::KICK_MEMBERS | Permissions::SEND_MESSAGES));
        assert!(!permissions.contains(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_administrator_grants_everything() {
        let permissions = resolve_permissions(GUILD, false, &role_table(), &[ADMINS]);
        assert_eq!(permissions, Permissions::all());
    }

    #[test]
    fn test_owner_has_every_permission() {
        let permissions = resolve_permissions(GUILD, true, &HashMap::new(), &[]);
        assert_eq!(permissions, Permissions::all());
    }

    #[test]
    fn test_unknown_roles_grant_nothing() {
        let permissions = resolve_permissions(GUILD, false, &HashMap::new(), &[RoleId(999)]);
        assert_eq!(permissions, Permissions::empty());
    }
}
