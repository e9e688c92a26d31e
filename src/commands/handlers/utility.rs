//! Utility command handlers
//!
//! Handles: ping, help, poll, loadstring
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Prefix commands; help generated from the registry catalog
//! - 1.0.0: Extracted from command handler

use async_trait::async_trait;
use log::info;

use super::unknown;
use crate::commands::context::CommandContext;
use crate::commands::handler::{Category, CommandError, CommandSpec, PrefixCommandHandler};
use crate::commands::invocation::Invocation;
use crate::core::{EmbedSpec, Reply, INFO_COLOR};

pub const POLL_REACTIONS: [&str; 3] = ["👍", "👎", "🤷"];
const LOADSTRING_SNIPPET: &str = r#"loadstring(game:HttpGet("hello"))()"#;

const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("ping", Category::Utility, "ping", "Gateway latency"),
    CommandSpec::new("help", Category::Utility, "help", "This list"),
    CommandSpec::new("poll", Category::Utility, "poll <question>", "Start a reaction poll"),
    CommandSpec::new("loadstring", Category::Utility, "loadstring", "Example loadstring snippet"),
];

/// Handler for utility commands: ping, help, poll, loadstring
pub struct UtilityHandler;

#[async_trait]
impl PrefixCommandHandler for UtilityHandler {
    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        match invocation.name.as_str() {
            "ping" => self.handle_ping(ctx, invocation).await,
            "help" => Ok(self.handle_help(ctx)),
            "poll" => self.handle_poll(invocation),
            "loadstring" => Ok(Reply::channel(LOADSTRING_SNIPPET)),
            other => Err(unknown(other)),
        }
    }
}

impl UtilityHandler {
    /// Handle .ping command
    async fn handle_ping(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        let text = match ctx.platform.gateway_latency().await {
            Some(latency) => format!("Pong! Latency is {}ms", latency.as_millis()),
            None => "Pong! Latency is not measured yet".to_string(),
        };

        info!("Ping command completed for user {}", invocation.invoker().id);
        Ok(Reply::channel(text))
    }

    /// Handle .help command
    fn handle_help(&self, ctx: &CommandContext<'_>) -> Reply {
        let prefix = ctx.prefix();
        let mut embed = EmbedSpec::new("Bot Commands")
            .color(INFO_COLOR)
            .description("Here are the available commands:");

        for category in Category::ALL {
            let names: Vec<String> = ctx
                .catalog
                .iter()
                .filter(|spec| spec.category == category)
                .map(|spec| format!("{prefix}{}", spec.name))
                .collect();
            if !names.is_empty() {
                embed = embed.field(category.title(), names.join(", "), false);
            }
        }

        Reply::embed(embed.footer(format!("Use {prefix} prefix before commands")))
    }

    /// Handle .poll command
    fn handle_poll(&self, invocation: &Invocation<'_>) -> Result<Reply, CommandError> {
        let question = invocation.rest(0);
        if question.is_empty() {
            return Err(CommandError::usage("Please provide a question for the poll."));
        }

        let embed = EmbedSpec::new("📊 Poll")
            .description(question)
            .color(INFO_COLOR)
            .footer(format!("Poll created by {}", invocation.invoker().tag));
        Ok(Reply::embed(embed).with_reactions(&POLL_REACTIONS))
    }
}
