use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tracing::{error, info, warn};

use calcu_core::CalcuConfig;
use calcu_engine::SessionContext;

use crate::error::DiscordError;
use crate::handler::CalcuHandler;

/// Discord front-end for the calculator.
///
/// Wraps a serenity `Client` and drives the event loop until the process exits,
/// rebuilding the client whenever the gateway drops. The [`SessionContext`]
/// is created once and handed to every client, so `ans` and the stored
/// calculations survive reconnects.
pub struct DiscordAdapter {
    config: CalcuConfig,
    token: String,
    session: Arc<SessionContext>,
}

impl DiscordAdapter {
    pub fn new(
        config: &CalcuConfig,
        token: impl Into<String>,
        session: Arc<SessionContext>,
    ) -> Result<Self, DiscordError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DiscordError::NoToken);
        }
        Ok(Self {
            config: config.clone(),
            token,
            session,
        })
    }

    /// Connect to Discord and keep reconnecting whenever the gateway drops.
    ///
    /// Never returns.
    pub async fn run(self) {
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::DIRECT_MESSAGE_REACTIONS;

        loop {
            let mut client = loop {
                match self.build_client(intents).await {
                    Ok(c) => break c,
                    Err(e) => {
                        error!("Discord: connect failed ({e}), retrying in 30s");
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            };

            info!("Discord: gateway connecting");

            if let Err(e) = client.start().await {
                warn!("Discord: gateway error ({e}), reconnecting in 5s");
            } else {
                info!("Discord: gateway stopped cleanly, reconnecting in 5s");
            }

            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    async fn build_client(&self, intents: GatewayIntents) -> Result<Client, serenity::Error> {
        let handler = CalcuHandler {
            session: Arc::clone(&self.session),
            config: self.config.clone(),
            engine: OnceLock::new(),
        };

        Client::builder(&self.token, intents)
            .event_handler(handler)
            .await
    }
}
