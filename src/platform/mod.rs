//! # Platform
//!
//! The chat-platform capabilities commands depend on, behind one trait so the
//! dispatcher and handlers run without a gateway connection.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod discord;
#[cfg(test)]
pub mod testing;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use std::time::Duration;

use crate::core::ReplyBody;

pub use discord::{SerenityPlatform, ShardManagerContainer};

/// A user referenced by an incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: UserId,
    /// `name#discriminator`
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// An inbound text message with everything dispatch needs to know about it
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    /// None for direct messages
    pub guild_id: Option<GuildId>,
    pub author: UserRef,
    pub author_is_bot: bool,
    pub content: String,
    /// Author's guild-level permissions; None outside guilds
    pub permissions: Option<Permissions>,
    pub mentioned_users: Vec<UserRef>,
    pub mentioned_roles: Vec<RoleId>,
    pub attachments: Vec<AttachmentRef>,
}

impl IncomingMessage {
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }

    pub fn first_mentioned_user(&self) -> Option<&UserRef> {
        self.mentioned_users.first()
    }

    pub fn first_mentioned_role(&self) -> Option<RoleId> {
        self.mentioned_roles.first().copied()
    }

    /// Channels mentioned as `<#id>` in the message text, in order
    pub fn mentioned_channels(&self) -> Vec<ChannelId> {
        self.content
            .split_whitespace()
            .filter_map(serenity::utils::parse_channel)
            .map(ChannelId)
            .collect()
    }

    pub fn has_permission(&self, required: Permissions) -> bool {
        self.permissions
            .map(|granted| granted.contains(required))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEntry {
    pub user: UserRef,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSummary {
    pub id: UserId,
    pub tag: String,
    pub guild_count: usize,
    pub user_count: usize,
    pub channel_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSummary {
    pub id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub member_count: u64,
    pub online_count: usize,
    pub boost_count: u64,
    pub icon_url: Option<String>,
    pub channel_names: Vec<String>,
    pub role_names: Vec<String>,
    /// Rendered emoji markup, e.g. `<:name:id>`
    pub emojis: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub tag: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    pub user: UserSummary,
    pub joined_at: Option<DateTime<Utc>>,
    pub role_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSummary {
    pub id: RoleId,
    pub name: String,
    pub color: u32,
    pub created_at: DateTime<Utc>,
    pub position: i64,
    pub mentionable: bool,
    pub member_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub name: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub nsfw: bool,
    pub topic: Option<String>,
}

/// Chat-platform capabilities used by commands and reply emission.
///
/// Every method reports failure through `anyhow::Result`; callers decide
/// what the user sees.
#[async_trait]
pub trait Platform: Send + Sync {
    // ---- messages ----

    async fn send_message(
        &self,
        channel: ChannelId,
        body: &ReplyBody,
        reference: Option<MessageId>,
    ) -> Result<MessageId>;

    /// Returns the channel and message id of the direct message
    async fn send_direct(&self, user: UserId, body: &ReplyBody) -> Result<(ChannelId, MessageId)>;

    async fn add_reaction(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()>;

    /// Delete up to `count` recent messages, skipping ones older than 14 days
    async fn purge_messages(&self, channel: ChannelId, count: u64) -> Result<usize>;

    async fn download_attachment(&self, url: &str) -> Result<Vec<u8>>;

    // ---- members ----

    async fn kick_member(&self, guild: GuildId, user: UserId) -> Result<()>;

    async fn ban_member(&self, guild: GuildId, user: UserId) -> Result<()>;

    async fn unban_user(&self, guild: GuildId, user: UserId) -> Result<()>;

    async fn list_bans(&self, guild: GuildId) -> Result<Vec<BanEntry>>;

    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<()>;

    async fn remove_timeout(&self, guild: GuildId, user: UserId) -> Result<()>;

    async fn set_nickname(&self, guild: GuildId, user: UserId, nickname: &str) -> Result<()>;

    async fn add_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    async fn remove_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    // ---- voice ----

    /// Voice channel the member is connected to, if any
    async fn voice_channel(&self, guild: GuildId, user: UserId) -> Result<Option<ChannelId>>;

    async fn disconnect_voice(&self, guild: GuildId, user: UserId) -> Result<()>;

    async fn set_deafened(&self, guild: GuildId, user: UserId, deafened: bool) -> Result<()>;

    // ---- channels, roles, invites ----

    async fn set_slowmode(&self, channel: ChannelId, seconds: u64) -> Result<()>;

    /// Deny (locked) or clear (unlocked) send-messages for the everyone role
    async fn set_channel_locked(&self, guild: GuildId, channel: ChannelId, locked: bool)
        -> Result<()>;

    async fn create_channel(&self, guild: GuildId, name: &str) -> Result<ChannelId>;

    /// Returns the deleted channel's name
    async fn delete_channel(&self, channel: ChannelId) -> Result<String>;

    /// Returns the created role's name
    async fn create_role(&self, guild: GuildId, name: &str) -> Result<String>;

    /// Returns the deleted role's name
    async fn delete_role(&self, guild: GuildId, role: RoleId) -> Result<String>;

    /// Returns the invite URL
    async fn create_invite(&self, channel: ChannelId) -> Result<String>;

    async fn count_invites(&self, guild: GuildId) -> Result<usize>;

    // ---- lookups ----

    /// Gateway heartbeat latency, once measured
    async fn gateway_latency(&self) -> Option<Duration>;

    async fn bot_summary(&self) -> Result<BotSummary>;

    async fn guild_summary(&self, guild: GuildId) -> Result<GuildSummary>;

    async fn user_summary(&self, user: UserId) -> Result<UserSummary>;

    async fn member_summary(&self, guild: GuildId, user: UserId) -> Result<MemberSummary>;

    async fn role_summary(&self, guild: GuildId, role: RoleId) -> Result<Option<RoleSummary>>;

    async fn channel_summary(&self, channel: ChannelId) -> Result<ChannelSummary>;
}
