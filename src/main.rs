use std::net::SocketAddr;

use anyhow::{Context as _, Result};
use dotenv::dotenv;
use raid_recruit_bot::{keepalive, Handler};
use serenity::all::{ChannelId, Client, GatewayIntents};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "raid_recruit_bot=info,serenity=warn".to_string()),
        )
        .init();

    let discord_token = std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;
    let raid_channel = std::env::var("RAID_CHANNEL_ID")
        .context("RAID_CHANNEL_ID must be set")?
        .parse::<u64>()
        .context("RAID_CHANNEL_ID must be a channel id")?;
    let health_addr: SocketAddr = std::env::var("HEALTH_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
        .parse()
        .context("HEALTH_ADDR must be a socket address")?;
    let self_ping_url = std::env::var("SELF_PING_URL")
        .unwrap_or_else(|_| "http://localhost:8000/health".to_string());

    tokio::spawn(async move {
        if let Err(e) = keepalive::run_health_server(health_addr).await {
            error!("health server stopped: {e}");
        }
    });
    tokio::spawn(keepalive::self_ping_loop(self_ping_url));

    let handler = Handler {
        raid_channel: ChannelId::new(raid_channel),
    };

    let intents = GatewayIntents::GUILDS;
    let mut client = Client::builder(&discord_token, intents)
        .event_handler(handler)
        .await
        .context("Err creating client")?;

    client.start().await.context("Client error")?;
    Ok(())
}
