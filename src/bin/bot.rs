use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::{Activity, Ready};
use serenity::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dotbot::commands::{default_registry, Dispatcher, Services};
use dotbot::core::Config;
use dotbot::features::{GitHubClient, GitHubPublisher, ScriptPublisher};
use dotbot::platform::discord::incoming_message;
use dotbot::platform::{SerenityPlatform, ShardManagerContainer};

/// How often stale cooldown entries are swept
const COOLDOWN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Handler {
    dispatcher: Arc<Dispatcher>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let incoming = incoming_message(&ctx, &msg).await;
        let platform = SerenityPlatform::new(ctx);
        self.dispatcher.dispatch(&platform, &incoming).await;
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.tag());
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        let prefix = &self.dispatcher.services().prefix;
        ctx.set_activity(Activity::playing(format!("use {prefix}help")))
            .await;
    }
}

fn build_publisher(config: &Config) -> Result<Option<Arc<dyn ScriptPublisher>>> {
    let Some(github) = &config.github else {
        info!("📄 GITHUB_TOKEN/GITHUB_USERNAME not set - script hosting disabled");
        return Ok(None);
    };

    let client = GitHubClient::new(&github.token, &github.api_url)?;
    let publisher: Arc<dyn ScriptPublisher> =
        Arc::new(GitHubPublisher::new(client, github.publish_settings()));
    info!("📦 Script hosting enabled for GitHub account {}", github.username);
    Ok(Some(publisher))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting dotbot...");

    let services = Services::new(config.command_prefix.clone(), build_publisher(&config)?);
    let registry = default_registry();
    info!("🧭 {} commands registered with prefix {:?}", registry.len(), config.command_prefix);

    let dispatcher = Arc::new(Dispatcher::new(registry, services, config.default_cooldown));

    // Sweep expired cooldown entries
    let sweeper = Arc::clone(&dispatcher);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(COOLDOWN_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweeper.cooldowns().purge_expired(Instant::now());
            if removed > 0 {
                debug!("Purged {removed} expired cooldown entries");
            }
        }
    });

    let handler = Handler { dispatcher };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_PRESENCES
        | GatewayIntents::GUILD_VOICE_STATES;

    // Build the Discord client with proper gateway configuration
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            error!("This could indicate:");
            error!("  - Invalid bot token format");
            error!("  - Network issues reaching Discord API");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(Arc::clone(&client.shard_manager));
    }

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        error!("This could be due to:");
        error!("  - Invalid bot token");
        error!("  - Network connectivity issues");
        error!("  - Privileged intents not enabled for this application");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
