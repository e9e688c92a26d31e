//! Prefix command dispatcher
//!
//! Turns one inbound message into at most one handler run and at most one
//! reply: parse, cooldown gate, scope, permission, handler, emission.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Registry-driven dispatch with cooldown and permission gates

use log::{debug, error, info, warn};
use serenity::model::id::{ChannelId, MessageId};
use std::time::{Duration, Instant};

use super::context::{CommandContext, Services};
use super::handler::{CommandError, Scope};
use super::invocation::Invocation;
use super::outcome::{cooldown_message, permission_message, DispatchOutcome};
use super::registry::CommandRegistry;
use crate::core::{truncate_for_message, Reply, ReplyBody, ReplyTarget};
use crate::features::{CooldownCheck, CooldownTracker};
use crate::platform::{IncomingMessage, Platform};

pub const GUILD_ONLY_MESSAGE: &str = "This command can only be used in a server.";
pub const DM_FAILED_NOTE: &str = "Couldn't DM you, so here it is:";
pub const DIRECT_ONLY_MESSAGE: &str =
    "This command only works in DMs for security reasons. Please DM me to use this command.";

/// Owns the registry, the cooldown store and the shared services
pub struct Dispatcher {
    registry: CommandRegistry,
    cooldowns: CooldownTracker,
    default_window: Duration,
    services: Services,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, services: Services, default_window: Duration) -> Self {
        Self {
            registry,
            cooldowns: CooldownTracker::new(),
            default_window,
            services,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Dispatch `message` and emit its reply
    pub async fn dispatch(&self, platform: &dyn Platform, message: &IncomingMessage) -> DispatchOutcome {
        self.dispatch_at(platform, message, Instant::now()).await
    }

    /// Same as [`Dispatcher::dispatch`] with an explicit clock reading
    pub async fn dispatch_at(
        &self,
        platform: &dyn Platform,
        message: &IncomingMessage,
        now: Instant,
    ) -> DispatchOutcome {
        let outcome = self.evaluate(platform, message, now).await;

        match &outcome {
            DispatchOutcome::Ignored => {}
            DispatchOutcome::NotFound { command } => {
                debug!("Unknown command {command} from user {}", message.author.id);
            }
            other => info!(
                "Command {} from user {}: {}",
                other.command().unwrap_or_default(),
                message.author.id,
                other.label()
            ),
        }

        if let Some(reply) = outcome.reply() {
            deliver(platform, message, reply).await;
        }
        outcome
    }

    async fn evaluate(
        &self,
        platform: &dyn Platform,
        message: &IncomingMessage,
        now: Instant,
    ) -> DispatchOutcome {
        if message.author_is_bot {
            return DispatchOutcome::Ignored;
        }
        let Some(invocation) = Invocation::parse(&self.services.prefix, message) else {
            return DispatchOutcome::Ignored;
        };
        let command = invocation.name.clone();

        let Some(registered) = self.registry.get(&command) else {
            return DispatchOutcome::NotFound { command };
        };
        let spec = registered.spec;

        // Recorded before the permission check: a denied attempt still uses the slot
        let window = spec.cooldown.unwrap_or(self.default_window);
        if let CooldownCheck::Denied { retry_after } =
            self.cooldowns
                .check_and_record(&command, message.author.id, now, window)
        {
            let reply = Reply::quote(cooldown_message(&command, retry_after));
            return DispatchOutcome::Cooldown {
                command,
                retry_after,
                reply,
            };
        }

        let scope_rejection = match spec.scope {
            Scope::GuildOnly if message.is_direct() => Some(GUILD_ONLY_MESSAGE),
            Scope::DirectOnly if !message.is_direct() => Some(DIRECT_ONLY_MESSAGE),
            _ => None,
        };
        if let Some(text) = scope_rejection {
            let reply = Reply::quote(text);
            return DispatchOutcome::OutOfScope { command, reply };
        }

        if let Some(required) = spec.permission {
            if !message.has_permission(required.permissions) {
                let reply = spec.respond(permission_message(required.noun));
                return DispatchOutcome::PermissionDenied { command, reply };
            }
        }

        let ctx = CommandContext {
            platform,
            services: &self.services,
            catalog: self.registry.catalog(),
        };
        match registered.handler.handle(&ctx, &invocation).await {
            Ok(reply) => DispatchOutcome::Handled { command, reply },
            Err(err) => {
                if let CommandError::Action { cause, .. } = &err {
                    warn!("Command {command} failed for user {}: {cause:#}", message.author.id);
                }
                let reply = spec.respond(err.user_message());
                DispatchOutcome::Failed { command, reply }
            }
        }
    }
}

/// Send a reply where it belongs; a failed direct message falls back to the channel
/// Post an undeliverable DM in the invoking channel, saying why it landed there
async fn send_dm_fallback(
    platform: &dyn Platform,
    message: &IncomingMessage,
    body: &ReplyBody,
) -> anyhow::Result<(ChannelId, MessageId)> {
    let channel = message.channel_id;
    let body = match body {
        ReplyBody::Text(text) => ReplyBody::Text(truncate_for_message(&format!(
            "{DM_FAILED_NOTE}\n{text}"
        ))),
        ReplyBody::Embed(_) => {
            let note = ReplyBody::Text(DM_FAILED_NOTE.to_string());
            platform.send_message(channel, &note, Some(message.message_id)).await?;
            body.clone()
        }
    };
    platform
        .send_message(channel, &body, Some(message.message_id))
        .await
        .map(|id| (channel, id))
}

async fn deliver(platform: &dyn Platform, message: &IncomingMessage, reply: &Reply) {
    let sent = match reply.target {
        ReplyTarget::Channel => platform
            .send_message(message.channel_id, &reply.body, None)
            .await
            .map(|id| (message.channel_id, id)),
        ReplyTarget::Quote => platform
            .send_message(message.channel_id, &reply.body, Some(message.message_id))
            .await
            .map(|id| (message.channel_id, id)),
        ReplyTarget::Invoker => match platform.send_direct(message.author.id, &reply.body).await {
            Ok(sent) => Ok(sent),
            Err(e) => {
                warn!("Could not DM user {}: {e:#}", message.author.id);
                send_dm_fallback(platform, message, &reply.body).await
            }
        },
    };

    let (channel, sent_id) = match sent {
        Ok(sent) => sent,
        Err(e) => {
            error!("Failed to deliver reply in channel {}: {e:#}", message.channel_id);
            return;
        }
    };

    for emoji in &reply.reactions {
        if let Err(e) = platform.add_reaction(channel, sent_id, emoji).await {
            warn!("Failed to add reaction {emoji}: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::default_registry;
    use crate::core::ReplyBody;
    use crate::features::{PublishError, ScriptPublisher, DEFAULT_COOLDOWN};
    use crate::platform::testing::*;
    use async_trait::async_trait;
    use serenity::model::permissions::Permissions;
    use std::sync::{Arc, Mutex};

    /// Records publish calls and answers with a fixed result
    struct RecordingPublisher {
        calls: Mutex<Vec<(String, String, String)>>,
        result: Result<String, PublishError>,
    }

    impl RecordingPublisher {
        fn returning(result: Result<String, PublishError>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                result,
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ScriptPublisher for RecordingPublisher {
        async fn publish(
            &self,
            repo_name: &str,
            file_name: &str,
            content: &str,
        ) -> Result<String, PublishError> {
            self.calls.lock().unwrap().push((
                repo_name.to_string(),
                file_name.to_string(),
                content.to_string(),
            ));
            self.result.clone()
        }
    }

    fn dispatcher_with(publisher: Option<Arc<dyn ScriptPublisher>>) -> Dispatcher {
        Dispatcher::new(
            default_registry(),
            Services::new(".", publisher),
            DEFAULT_COOLDOWN,
        )
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(None)
    }

    #[tokio::test]
    async fn test_ping_twice_within_a_second() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let message = guild_message(ALICE, ".ping", Permissions::empty());
        let start = Instant::now();

        let first = dispatcher.dispatch_at(&platform, &message, start).await;
        let second = dispatcher
            .dispatch_at(&platform, &message, start + Duration::from_millis(800))
            .await;

        assert!(matches!(first, DispatchOutcome::Handled { .. }));
        let DispatchOutcome::Cooldown { retry_after, .. } = second else {
            panic!("expected cooldown, got {second:?}");
        };
        let secs = retry_after.as_secs_f64();
        assert!((2.0..=3.0).contains(&secs));

        let texts = platform.sent_texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("Latency is 42ms"));
        assert_eq!(
            texts[1],
            "Please wait 2.2 more second(s) before using the `ping` command."
        );
    }

    #[tokio::test]
    async fn test_spaced_invocations_both_allowed() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let message = guild_message(ALICE, ".coinflip", Permissions::empty());
        let start = Instant::now();

        let first = dispatcher.dispatch_at(&platform, &message, start).await;
        let second = dispatcher
            .dispatch_at(&platform, &message, start + DEFAULT_COOLDOWN)
            .await;

        assert!(matches!(first, DispatchOutcome::Handled { .. }));
        assert!(matches!(second, DispatchOutcome::Handled { .. }));
    }

    #[tokio::test]
    async fn test_createrole_without_permission() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let message = guild_message(BOB, ".createrole VIP", Permissions::SEND_MESSAGES);

        let outcome = dispatcher.dispatch(&platform, &message).await;

        assert!(matches!(outcome, DispatchOutcome::PermissionDenied { .. }));
        assert_eq!(
            platform.sent_texts(),
            vec!["You do not have permission to manage roles.".to_string()]
        );
        assert!(platform.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_permission_denial_consumes_cooldown() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let message = guild_message(BOB, ".kick <@3>", Permissions::empty());
        let now = Instant::now();

        dispatcher.dispatch_at(&platform, &message, now).await;
        assert!(dispatcher
            .cooldowns()
            .remaining("kick", BOB, now)
            .is_some());

        let retry = dispatcher
            .dispatch_at(&platform, &message, now + Duration::from_millis(100))
            .await;
        assert!(matches!(retry, DispatchOutcome::Cooldown { .. }));
    }

    #[tokio::test]
    async fn test_unknown_command_is_silent() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let message = guild_message(ALICE, ".frobnicate now", Permissions::all());

        let outcome = dispatcher.dispatch(&platform, &message).await;

        assert_eq!(
            outcome,
            DispatchOutcome::NotFound {
                command: "frobnicate".to_string()
            }
        );
        assert!(platform.calls().is_empty());
        assert!(dispatcher.cooldowns().is_empty());
    }

    #[tokio::test]
    async fn test_bot_and_unprefixed_messages_ignored() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let mut from_bot = guild_message(ALICE, ".ping", Permissions::all());
        from_bot.author_is_bot = true;
        let plain = guild_message(ALICE, "ping", Permissions::all());

        assert_eq!(dispatcher.dispatch(&platform, &from_bot).await, DispatchOutcome::Ignored);
        assert_eq!(dispatcher.dispatch(&platform, &plain).await, DispatchOutcome::Ignored);
        assert!(platform.calls().is_empty());
        assert!(dispatcher.cooldowns().is_empty());
    }

    #[tokio::test]
    async fn test_command_name_is_case_insensitive() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let message = guild_message(ALICE, ".PiNg", Permissions::empty());

        let outcome = dispatcher.dispatch(&platform, &message).await;
        assert_eq!(outcome.command(), Some("ping"));
        assert!(matches!(outcome, DispatchOutcome::Handled { .. }));
    }

    #[tokio::test]
    async fn test_guild_only_command_in_dm() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let message = direct_message(ALICE, ".serverinfo");

        let outcome = dispatcher.dispatch(&platform, &message).await;

        assert!(matches!(outcome, DispatchOutcome::OutOfScope { .. }));
        assert_eq!(platform.sent_texts(), vec![GUILD_ONLY_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_autoloadstring_in_guild_rejected() {
        let publisher = RecordingPublisher::returning(Ok("unused".to_string()));
        let dispatcher = dispatcher_with(Some(publisher.clone()));
        let platform = MockPlatform::new();
        let message = with_attachment(
            guild_message(ALICE, ".autoloadstring", Permissions::all()),
            "script.txt",
        );

        let outcome = dispatcher.dispatch(&platform, &message).await;

        assert!(matches!(outcome, DispatchOutcome::OutOfScope { .. }));
        assert_eq!(platform.sent_texts(), vec![DIRECT_ONLY_MESSAGE.to_string()]);
        assert_eq!(publisher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_autoloadstring_requires_txt_attachment() {
        let publisher = RecordingPublisher::returning(Ok("unused".to_string()));
        let dispatcher = dispatcher_with(Some(publisher.clone()));
        let platform = MockPlatform::new();
        let message = with_attachment(direct_message(ALICE, ".autoloadstring"), "script.lua");

        let outcome = dispatcher.dispatch(&platform, &message).await;

        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert_eq!(
            platform.sent_texts(),
            vec!["Please attach a .txt file containing your script.".to_string()]
        );
        assert_eq!(publisher.call_count(), 0);
        assert!(!platform
            .calls()
            .iter()
            .any(|call| matches!(call, Call::Download(_))));
    }

    #[tokio::test]
    async fn test_autoloadstring_returns_loadstring_snippet() {
        let url = "https://raw.githubusercontent.com/octo/script_1/main/script_1.lua";
        let publisher = RecordingPublisher::returning(Ok(url.to_string()));
        let dispatcher = dispatcher_with(Some(publisher.clone()));
        let platform = MockPlatform::new();
        let message = with_attachment(direct_message(ALICE, ".autoloadstring"), "script.txt");

        let outcome = dispatcher.dispatch(&platform, &message).await;

        let DispatchOutcome::Handled { reply, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(
            reply.text(),
            Some(format!(
                "Here's your loadstring command:\n```lua\nloadstring(game:HttpGet(\"{url}\"))()\n```"
            ))
            .as_deref()
        );
        let calls = publisher.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, "print(1)");
        assert!(calls[0].0.starts_with("script_"));
        assert!(calls[0].1.starts_with("script_1_"));
    }

    #[tokio::test]
    async fn test_autoloadstring_reports_repository_failure() {
        let publisher = RecordingPublisher::returning(Err(PublishError::RepositoryCreation(
            "name already exists on this account".to_string(),
        )));
        let dispatcher = dispatcher_with(Some(publisher));
        let platform = MockPlatform::new();
        let message = with_attachment(direct_message(ALICE, ".autoloadstring"), "script.txt");

        dispatcher.dispatch(&platform, &message).await;

        let texts = platform.sent_texts();
        assert_eq!(
            texts.last().map(String::as_str),
            Some("Failed to create GitHub repository: Failed to create repository: name already exists on this account")
        );
    }

    #[tokio::test]
    async fn test_action_failure_is_isolated() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        platform.fail("kick_member");
        let kick = with_mentions(
            guild_message(ALICE, ".kick <@3>", Permissions::KICK_MEMBERS),
            &[CAROL],
        );

        let outcome = dispatcher.dispatch(&platform, &kick).await;
        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert_eq!(
            platform.sent_texts(),
            vec!["I was unable to kick the user.".to_string()]
        );

        let ping = guild_message(ALICE, ".ping", Permissions::empty());
        let next = dispatcher.dispatch(&platform, &ping).await;
        assert!(matches!(next, DispatchOutcome::Handled { .. }));
    }

    #[tokio::test]
    async fn test_direct_reply_falls_back_to_channel() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        platform.fail("send_direct");
        let message = guild_message(ALICE, ".delchannel", Permissions::MANAGE_CHANNELS);

        dispatcher.dispatch(&platform, &message).await;

        let sent = platform.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ReplyTarget::Quote);
        assert_eq!(
            sent[0].1,
            ReplyBody::Text(format!("{DM_FAILED_NOTE}\nDeleted channel general"))
        );
    }

    #[tokio::test]
    async fn test_poll_reactions_added() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        let message = guild_message(ALICE, ".poll Pizza tonight?", Permissions::empty());

        dispatcher.dispatch(&platform, &message).await;

        let reactions: Vec<String> = platform
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::React { emoji, .. } => Some(emoji),
                _ => None,
            })
            .collect();
        assert_eq!(reactions, vec!["👍", "👎", "🤷"]);
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_panic() {
        let dispatcher = dispatcher();
        let platform = MockPlatform::new();
        platform.fail("send_message");
        let message = guild_message(ALICE, ".ping", Permissions::empty());

        let outcome = dispatcher.dispatch(&platform, &message).await;
        assert!(matches!(outcome, DispatchOutcome::Handled { .. }));
    }
}
