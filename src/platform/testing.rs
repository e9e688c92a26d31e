//! In-memory [`Platform`] double that records every call

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{
    AttachmentRef, BanEntry, BotSummary, ChannelSummary, GuildSummary, IncomingMessage,
    MemberSummary, Platform, RoleSummary, UserRef, UserSummary,
};
use crate::core::{ReplyBody, ReplyTarget};

pub const GUILD: GuildId = GuildId(100);
pub const CHANNEL: ChannelId = ChannelId(200);
pub const DM_CHANNEL: ChannelId = ChannelId(201);
pub const MESSAGE: MessageId = MessageId(300);
pub const ALICE: UserId = UserId(1);
pub const BOB: UserId = UserId(2);
pub const CAROL: UserId = UserId(3);
pub const VIP_ROLE: RoleId = RoleId(400);

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 14, 12, 0, 0).unwrap()
}

pub fn user(id: UserId) -> UserRef {
    let name = match id.0 {
        1 => "alice",
        2 => "bob",
        3 => "carol",
        _ => "someone",
    };
    UserRef {
        id,
        tag: format!("{name}#000{}", id.0),
    }
}

/// A guild message from `author` with the given permissions
pub fn guild_message(author: UserId, content: &str, permissions: Permissions) -> IncomingMessage {
    IncomingMessage {
        message_id: MESSAGE,
        channel_id: CHANNEL,
        guild_id: Some(GUILD),
        author: user(author),
        author_is_bot: false,
        content: content.to_string(),
        permissions: Some(permissions),
        mentioned_users: Vec::new(),
        mentioned_roles: Vec::new(),
        attachments: Vec::new(),
    }
}

pub fn direct_message(author: UserId, content: &str) -> IncomingMessage {
    IncomingMessage {
        channel_id: DM_CHANNEL,
        guild_id: None,
        permissions: None,
        ..guild_message(author, content, Permissions::empty())
    }
}

pub fn with_mentions(mut message: IncomingMessage, users: &[UserId]) -> IncomingMessage {
    message.mentioned_users = users.iter().copied().map(user).collect();
    message
}

pub fn with_roles(mut message: IncomingMessage, roles: &[RoleId]) -> IncomingMessage {
    message.mentioned_roles = roles.to_vec();
    message
}

pub fn with_attachment(mut message: IncomingMessage, filename: &str) -> IncomingMessage {
    message.attachments.push(AttachmentRef {
        filename: filename.to_string(),
        url: format!("https://cdn.example.com/{filename}"),
        size: 16,
    });
    message
}

/// One observed platform call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        channel: ChannelId,
        target: ReplyTarget,
        body: ReplyBody,
    },
    React {
        message: MessageId,
        emoji: String,
    },
    Purge(ChannelId, u64),
    Download(String),
    Kick(UserId),
    Ban(UserId),
    Unban(UserId),
    ListBans,
    Timeout(UserId, DateTime<Utc>, String),
    RemoveTimeout(UserId),
    Nickname(UserId, String),
    AddRole(UserId, RoleId),
    RemoveRole(UserId, RoleId),
    DisconnectVoice(UserId),
    Deafen(UserId, bool),
    Slowmode(ChannelId, u64),
    Lock(ChannelId, bool),
    CreateChannel(String),
    DeleteChannel(ChannelId),
    CreateRole(String),
    DeleteRole(RoleId),
    CreateInvite(ChannelId),
    CountInvites,
}

impl Call {
    /// Whether this call changes platform state (anything but sending or reading)
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Call::Send { .. } | Call::React { .. } | Call::Download(_) | Call::ListBans | Call::CountInvites
        )
    }
}

/// Records calls; operations named in `failing` return an error
pub struct MockPlatform {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<&'static str>>,
    next_message: AtomicU64,
    pub latency: Option<Duration>,
    pub bans: Vec<BanEntry>,
    pub voice: HashMap<UserId, ChannelId>,
    pub attachment_body: Vec<u8>,
    pub roles: HashMap<RoleId, String>,
    pub invite_count: usize,
    pub purge_result: Option<usize>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            next_message: AtomicU64::new(1000),
            latency: Some(Duration::from_millis(42)),
            bans: Vec::new(),
            voice: HashMap::new(),
            attachment_body: b"print(1)".to_vec(),
            roles: HashMap::from([(VIP_ROLE, "VIP".to_string())]),
            invite_count: 0,
            purge_result: None,
        }
    }

    /// Make the named operation fail from now on
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Text of every message sent, in order
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send {
                    body: ReplyBody::Text(text),
                    ..
                } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<(ReplyTarget, ReplyBody)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { target, body, .. } => Some((target, body)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.failing.lock().unwrap().contains(operation) {
            Err(anyhow!("{operation} rejected by platform"))
        } else {
            Ok(())
        }
    }

    fn record_checked(&self, operation: &'static str, call: Call) -> Result<()> {
        self.check(operation)?;
        self.record(call);
        Ok(())
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_message.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn send_message(
        &self,
        channel: ChannelId,
        body: &ReplyBody,
        reference: Option<MessageId>,
    ) -> Result<MessageId> {
        let target = if reference.is_some() {
            ReplyTarget::Quote
        } else {
            ReplyTarget::Channel
        };
        self.record_checked(
            "send_message",
            Call::Send {
                channel,
                target,
                body: body.clone(),
            },
        )?;
        Ok(self.next_id())
    }

    async fn send_direct(&self, user: UserId, body: &ReplyBody) -> Result<(ChannelId, MessageId)> {
        self.record_checked(
            "send_direct",
            Call::Send {
                channel: ChannelId(user.0),
                target: ReplyTarget::Invoker,
                body: body.clone(),
            },
        )?;
        Ok((ChannelId(user.0), self.next_id()))
    }

    async fn add_reaction(&self, _channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        self.record_checked(
            "add_reaction",
            Call::React {
                message,
                emoji: emoji.to_string(),
            },
        )
    }

    async fn purge_messages(&self, channel: ChannelId, count: u64) -> Result<usize> {
        self.record_checked("purge_messages", Call::Purge(channel, count))?;
        Ok(self.purge_result.unwrap_or(count as usize))
    }

    async fn download_attachment(&self, url: &str) -> Result<Vec<u8>> {
        self.record_checked("download_attachment", Call::Download(url.to_string()))?;
        Ok(self.attachment_body.clone())
    }

    async fn kick_member(&self, _guild: GuildId, user: UserId) -> Result<()> {
        self.record_checked("kick_member", Call::Kick(user))
    }

    async fn ban_member(&self, _guild: GuildId, user: UserId) -> Result<()> {
        self.record_checked("ban_member", Call::Ban(user))
    }

    async fn unban_user(&self, _guild: GuildId, user: UserId) -> Result<()> {
        self.record_checked("unban_user", Call::Unban(user))
    }

    async fn list_bans(&self, _guild: GuildId) -> Result<Vec<BanEntry>> {
        self.record_checked("list_bans", Call::ListBans)?;
        Ok(self.bans.clone())
    }

    async fn timeout_member(
        &self,
        _guild: GuildId,
        user: UserId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<()> {
        self.record_checked("timeout_member", Call::Timeout(user, until, reason.to_string()))
    }

    async fn remove_timeout(&self, _guild: GuildId, user: UserId) -> Result<()> {
        self.record_checked("remove_timeout", Call::RemoveTimeout(user))
    }

    async fn set_nickname(&self, _guild: GuildId, user: UserId, nickname: &str) -> Result<()> {
        self.record_checked("set_nickname", Call::Nickname(user, nickname.to_string()))
    }

    async fn add_member_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.record_checked("add_member_role", Call::AddRole(user, role))
    }

    async fn remove_member_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.record_checked("remove_member_role", Call::RemoveRole(user, role))
    }

    async fn voice_channel(&self, _guild: GuildId, user: UserId) -> Result<Option<ChannelId>> {
        self.check("voice_channel")?;
        Ok(self.voice.get(&user).copied())
    }

    async fn disconnect_voice(&self, _guild: GuildId, user: UserId) -> Result<()> {
        self.record_checked("disconnect_voice", Call::DisconnectVoice(user))
    }

    async fn set_deafened(&self, _guild: GuildId, user: UserId, deafened: bool) -> Result<()> {
        self.record_checked("set_deafened", Call::Deafen(user, deafened))
    }

    async fn set_slowmode(&self, channel: ChannelId, seconds: u64) -> Result<()> {
        self.record_checked("set_slowmode", Call::Slowmode(channel, seconds))
    }

    async fn set_channel_locked(
        &self,
        _guild: GuildId,
        channel: ChannelId,
        locked: bool,
    ) -> Result<()> {
        self.record_checked("set_channel_locked", Call::Lock(channel, locked))
    }

    async fn create_channel(&self, _guild: GuildId, name: &str) -> Result<ChannelId> {
        self.record_checked("create_channel", Call::CreateChannel(name.to_string()))?;
        Ok(ChannelId(555))
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<String> {
        self.record_checked("delete_channel", Call::DeleteChannel(channel))?;
        Ok("general".to_string())
    }

    async fn create_role(&self, _guild: GuildId, name: &str) -> Result<String> {
        self.record_checked("create_role", Call::CreateRole(name.to_string()))?;
        Ok(name.to_string())
    }

    async fn delete_role(&self, _guild: GuildId, role: RoleId) -> Result<String> {
        self.check("delete_role")?;
        let name = self
            .roles
            .get(&role)
            .cloned()
            .ok_or_else(|| anyhow!("unknown role {role}"))?;
        self.record(Call::DeleteRole(role));
        Ok(name)
    }

    async fn create_invite(&self, channel: ChannelId) -> Result<String> {
        self.record_checked("create_invite", Call::CreateInvite(channel))?;
        Ok("https://discord.gg/abc123".to_string())
    }

    async fn count_invites(&self, _guild: GuildId) -> Result<usize> {
        self.record_checked("count_invites", Call::CountInvites)?;
        Ok(self.invite_count)
    }

    async fn gateway_latency(&self) -> Option<Duration> {
        self.latency
    }

    async fn bot_summary(&self) -> Result<BotSummary> {
        self.check("bot_summary")?;
        Ok(BotSummary {
            id: UserId(999),
            tag: "dotbot#0001".to_string(),
            guild_count: 3,
            user_count: 120,
            channel_count: 42,
        })
    }

    async fn guild_summary(&self, guild: GuildId) -> Result<GuildSummary> {
        self.check("guild_summary")?;
        Ok(GuildSummary {
            id: guild,
            name: "Test Guild".to_string(),
            owner_id: ALICE,
            created_at: fixed_time(),
            member_count: 25,
            online_count: 7,
            boost_count: 2,
            icon_url: Some("https://cdn.example.com/icon.png".to_string()),
            channel_names: vec!["general".to_string(), "memes".to_string()],
            role_names: vec!["VIP".to_string(), "@everyone".to_string()],
            emojis: Vec::new(),
        })
    }

    async fn user_summary(&self, user: UserId) -> Result<UserSummary> {
        self.check("user_summary")?;
        Ok(UserSummary {
            id: user,
            tag: self::user(user).tag,
            avatar_url: format!("https://cdn.example.com/avatars/{}.png", user.0),
            created_at: fixed_time(),
        })
    }

    async fn member_summary(&self, _guild: GuildId, user: UserId) -> Result<MemberSummary> {
        self.check("member_summary")?;
        Ok(MemberSummary {
            user: self.user_summary(user).await?,
            joined_at: Some(fixed_time()),
            role_names: vec!["VIP".to_string()],
        })
    }

    async fn role_summary(&self, _guild: GuildId, role: RoleId) -> Result<Option<RoleSummary>> {
        self.check("role_summary")?;
        Ok(self.roles.get(&role).map(|name| RoleSummary {
            id: role,
            name: name.clone(),
            color: 0xff0000,
            created_at: fixed_time(),
            position: 3,
            mentionable: true,
            member_count: 4,
        }))
    }

    async fn channel_summary(&self, channel: ChannelId) -> Result<ChannelSummary> {
        self.check("channel_summary")?;
        Ok(ChannelSummary {
            id: channel,
            name: "general".to_string(),
            kind: "text".to_string(),
            created_at: fixed_time(),
            nsfw: false,
            topic: None,
        })
    }
}
