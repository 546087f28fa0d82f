use std::sync::{Arc, OnceLock};

use serenity::async_trait;
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use tracing::{debug, info, warn};

use calcu_core::CalcuConfig;
use calcu_engine::{BotIdentity, Engine, SessionContext};

use crate::convert;
use crate::presence;
use crate::transport::SerenityTransport;

/// Serenity event handler wired to the calculation engine.
///
/// The engine needs the bot's own user id, so it is built on `ready`.
/// Events arriving before that are dropped.
pub struct CalcuHandler {
    pub session: Arc<SessionContext>,
    pub config: CalcuConfig,
    pub engine: OnceLock<Arc<Engine>>,
}

impl CalcuHandler {
    fn engine(&self) -> Option<Arc<Engine>> {
        self.engine.get().cloned()
    }
}

#[async_trait]
impl EventHandler for CalcuHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let bot = BotIdentity::new(ready.user.id.get());
        self.engine
            .get_or_init(|| Arc::new(Engine::new(Arc::clone(&self.session), &self.config, bot)));

        let presence = presence::presence(&self.config.discord);
        ctx.set_presence(presence.activity, presence.status);

        info!(name = %ready.user.name, guilds = ready.guilds.len(), "Discord bot connected");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(engine) = self.engine() else {
            return;
        };

        let (kind, channel_name) = convert::resolve_channel(&ctx, &msg).await;
        let event = convert::message_received(&msg, engine.bot(), kind, channel_name);
        let transport = SerenityTransport::new(Arc::clone(&ctx.http), engine.bot());

        tokio::spawn(async move {
            match engine.on_message(&transport, event).await {
                Ok(outcome) => debug!(?outcome, "message handled"),
                Err(e) => warn!(error = %e, "Discord transport failed while handling message"),
            }
        });
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        let Some(engine) = self.engine() else {
            return;
        };
        let bot = engine.bot();
        if reaction.user_id.is_some_and(|u| u.get() == bot.user.0) {
            return;
        }

        // Gateway payloads for guild reactions carry the author; DMs need a fetch.
        let author = match reaction.message_author_id {
            Some(id) => Some(id.get()),
            None => match reaction.message(&ctx.http).await {
                Ok(m) => Some(m.author.id.get()),
                Err(e) => {
                    debug!(error = %e, "could not fetch reacted message");
                    None
                }
            },
        };

        let Some(event) = convert::reaction_added(&reaction, bot, author) else {
            return;
        };
        let transport = SerenityTransport::new(Arc::clone(&ctx.http), bot);

        tokio::spawn(async move {
            match engine.on_reaction(&transport, event).await {
                Ok(outcome) => debug!(?outcome, "reaction handled"),
                Err(e) => warn!(error = %e, "Discord transport failed while handling reaction"),
            }
        });
    }
}
