//! Script hosting command handler
//!
//! Handles: autoloadstring
//!
//! Takes a `.txt` attachment sent by DM, publishes it as a Lua file in a fresh
//! public repository and answers with a loadstring snippet for its raw URL.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Initial autoloadstring command

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};

use super::unknown;
use crate::commands::context::CommandContext;
use crate::commands::handler::{Category, CommandError, CommandSpec, OrReply, PrefixCommandHandler};
use crate::commands::invocation::Invocation;
use crate::core::file_utils::{format_file_size, has_extension, SCRIPT_ATTACHMENT_LIMIT};
use crate::core::{Reply, ReplyBody};

const COMMANDS: &[CommandSpec] = &[CommandSpec::new(
    "autoloadstring",
    Category::Utility,
    "autoloadstring (DM, attach a .txt file)",
    "Host a script and get a loadstring for it",
)
.direct_only()
.quoting()];

/// Handler for hosting user scripts
pub struct ScriptHandler;

#[async_trait]
impl PrefixCommandHandler for ScriptHandler {
    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        match invocation.name.as_str() {
            "autoloadstring" => self.handle_autoloadstring(ctx, invocation).await,
            other => Err(unknown(other)),
        }
    }
}

impl ScriptHandler {
    async fn handle_autoloadstring(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Reply, CommandError> {
        const PROCESSING_FAILED: &str =
            "An error occurred while processing your script. Please try again later.";

        let message = invocation.message;
        let attachment = message
            .attachments
            .first()
            .filter(|attachment| has_extension(&attachment.filename, "txt"))
            .ok_or_else(|| CommandError::usage("Please attach a .txt file containing your script."))?;

        if attachment.size > SCRIPT_ATTACHMENT_LIMIT {
            return Err(CommandError::usage(format!(
                "That file is too large. The limit is {}.",
                format_file_size(SCRIPT_ATTACHMENT_LIMIT)
            )));
        }

        let Some(publisher) = ctx.services.publisher.as_ref() else {
            return Err(CommandError::usage(
                "Script hosting is not configured on this bot.",
            ));
        };

        let progress = ReplyBody::Text("Processing your script file...".to_string());
        if let Err(e) = ctx
            .platform
            .send_message(message.channel_id, &progress, Some(message.message_id))
            .await
        {
            warn!("Failed to send progress message: {e:#}");
        }

        let bytes = ctx
            .platform
            .download_attachment(&attachment.url)
            .await
            .or_reply(PROCESSING_FAILED)?;
        let content = String::from_utf8_lossy(&bytes);
        if content.trim().is_empty() {
            return Err(CommandError::usage(
                "The text file appears to be empty. Please provide a file with content.",
            ));
        }

        let millis = Utc::now().timestamp_millis();
        let repo_name = format!("script_{millis}");
        let file_name = format!("script_{}_{millis}.lua", message.author.id);

        let url = publisher
            .publish(&repo_name, &file_name, &content)
            .await
            .map_err(|e| {
                CommandError::action(
                    format!("Failed to create GitHub repository: {e}"),
                    anyhow!("publishing {file_name} to {repo_name}: {e:?}"),
                )
            })?;

        info!("Script {file_name} hosted for user {}", message.author.id);
        Ok(Reply::quote(format!(
            "Here's your loadstring command:\n```lua\n{}\n```",
            loadstring_for(&url)
        )))
    }
}

/// `loadstring(game:HttpGet("<url>"))()`
pub fn loadstring_for(url: &str) -> String {
    format!(r#"loadstring(game:HttpGet("{url}"))()"#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::Services;
    use crate::commands::handlers::run_handler;
    use crate::features::{PublishError, ScriptPublisher};
    use crate::platform::testing::*;
    use crate::platform::IncomingMessage;
    use std::sync::{Arc, Mutex};

    struct FixedPublisher {
        published: Mutex<Vec<(String, String, String)>>,
        result: Result<String, PublishError>,
    }

    #[async_trait]
    impl ScriptPublisher for FixedPublisher {
        async fn publish(
            &self,
            repo_name: &str,
            file_name: &str,
            content: &str,
        ) -> Result<String, PublishError> {
            self.published.lock().unwrap().push((
                repo_name.to_string(),
                file_name.to_string(),
                content.to_string(),
            ));
            self.result.clone()
        }
    }

    fn publisher(result: Result<String, PublishError>) -> Arc<FixedPublisher> {
        Arc::new(FixedPublisher {
            published: Mutex::new(Vec::new()),
            result,
        })
    }

    async fn run(
        platform: &MockPlatform,
        publisher: Option<Arc<FixedPublisher>>,
        message: &IncomingMessage,
    ) -> Result<Reply, CommandError> {
        let publisher = publisher.map(|p| p as Arc<dyn ScriptPublisher>);
        run_handler(&ScriptHandler, platform, &Services::new(".", publisher), message).await
    }

    fn dm_with(filename: &str) -> IncomingMessage {
        with_attachment(direct_message(ALICE, ".autoloadstring"), filename)
    }

    #[test]
    fn test_loadstring_for() {
        assert_eq!(
            loadstring_for("https://raw.githubusercontent.com/o/r/main/s.lua"),
            r#"loadstring(game:HttpGet("https://raw.githubusercontent.com/o/r/main/s.lua"))()"#
        );
    }

    #[tokio::test]
    async fn test_success_names_and_snippet() {
        let platform = MockPlatform::new();
        let fixed = publisher(Ok("https://raw.example/x.lua".to_string()));
        let reply = run(&platform, Some(fixed.clone()), &dm_with("cool.txt"))
            .await
            .unwrap();

        assert_eq!(
            reply.text(),
            Some("Here's your loadstring command:\n```lua\nloadstring(game:HttpGet(\"https://raw.example/x.lua\"))()\n```")
        );
        assert_eq!(
            platform.sent_texts(),
            vec!["Processing your script file...".to_string()]
        );

        let published = fixed.published.lock().unwrap().clone();
        let (repo, file, content) = &published[0];
        let millis = repo.strip_prefix("script_").unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(file, &format!("script_1_{millis}.lua"));
        assert_eq!(content, "print(1)");
    }

    #[tokio::test]
    async fn test_missing_attachment() {
        let platform = MockPlatform::new();
        let fixed = publisher(Ok(String::new()));
        let message = direct_message(ALICE, ".autoloadstring");
        let err = run(&platform, Some(fixed.clone()), &message).await.unwrap_err();

        assert_eq!(err.user_message(), "Please attach a .txt file containing your script.");
        assert!(platform.calls().is_empty());
        assert!(fixed.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_attachment() {
        let platform = MockPlatform::new();
        let mut message = dm_with("big.txt");
        message.attachments[0].size = SCRIPT_ATTACHMENT_LIMIT + 1;
        let err = run(&platform, Some(publisher(Ok(String::new()))), &message)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "That file is too large. The limit is 1.0 MB.");
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_file() {
        let mut platform = MockPlatform::new();
        platform.attachment_body = b"  \n\t ".to_vec();
        let fixed = publisher(Ok(String::new()));
        let err = run(&platform, Some(fixed.clone()), &dm_with("blank.txt"))
            .await
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            "The text file appears to be empty. Please provide a file with content."
        );
        assert!(fixed.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_failure() {
        let platform = MockPlatform::new();
        platform.fail("download_attachment");
        let err = run(&platform, Some(publisher(Ok(String::new()))), &dm_with("a.txt"))
            .await
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            "An error occurred while processing your script. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_upload_failure_message() {
        let platform = MockPlatform::new();
        let fixed = publisher(Err(PublishError::Upload("sha wasn't supplied".to_string())));
        let err = run(&platform, Some(fixed), &dm_with("a.txt")).await.unwrap_err();

        assert_eq!(
            err.user_message(),
            "Failed to create GitHub repository: Failed to upload file: sha wasn't supplied"
        );
    }

    #[tokio::test]
    async fn test_not_configured() {
        let platform = MockPlatform::new();
        let err = run(&platform, None, &dm_with("a.txt")).await.unwrap_err();

        assert_eq!(err.user_message(), "Script hosting is not configured on this bot.");
        assert!(platform.calls().is_empty());
    }
}
