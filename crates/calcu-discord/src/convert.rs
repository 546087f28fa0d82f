//! serenity models → engine events.

use chrono::{DateTime, Utc};
use serenity::model::channel::{Channel, ChannelType, Message, Reaction, ReactionType};
use serenity::prelude::Context;
use tracing::debug;

use calcu_core::{ActorRef, ChannelKind, ChannelRef, MessageRef};
use calcu_engine::{BotIdentity, MessageReceived, ReactionAdded};

pub fn message_ref(msg: &Message) -> MessageRef {
    MessageRef::new(msg.channel_id.get(), msg.id.get())
}

pub fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Private => ChannelKind::Direct,
        ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread => {
            ChannelKind::Thread
        }
        _ => ChannelKind::Guild,
    }
}

/// Bots, webhooks, and system accounts are not human authors.
pub fn is_human(msg: &Message) -> bool {
    !msg.author.bot && !msg.author.system && msg.webhook_id.is_none()
}

/// Textual form of an emoji as the reaction vocabulary spells it.
pub fn emoji_text(emoji: &ReactionType) -> String {
    match emoji {
        ReactionType::Unicode(s) => s.clone(),
        other => other.to_string(),
    }
}

fn timestamp(msg: &Message) -> DateTime<Utc> {
    DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0).unwrap_or_else(Utc::now)
}

/// Build a [`MessageReceived`] with explicit channel metadata.
pub fn message_received(
    msg: &Message,
    bot: BotIdentity,
    kind: ChannelKind,
    channel_name: Option<String>,
) -> MessageReceived {
    MessageReceived {
        id: message_ref(msg),
        author: ActorRef(msg.author.id.get()),
        author_is_human: is_human(msg),
        content: msg.content.clone(),
        mentions_bot: msg.mentions.iter().any(|u| u.id.get() == bot.user.0),
        channel: ChannelRef(msg.channel_id.get()),
        channel_kind: kind,
        channel_name,
        timestamp: timestamp(msg),
    }
}

/// Resolve the channel's kind and name, from the guild cache when possible.
pub async fn resolve_channel(ctx: &Context, msg: &Message) -> (ChannelKind, Option<String>) {
    let Some(guild_id) = msg.guild_id else {
        return (ChannelKind::Direct, None);
    };

    let cached = ctx.cache.guild(guild_id).and_then(|guild| {
        guild
            .channels
            .get(&msg.channel_id)
            .or_else(|| guild.threads.iter().find(|t| t.id == msg.channel_id))
            .map(|ch| (channel_kind(ch.kind), ch.name.clone()))
    });
    if let Some((kind, name)) = cached {
        return (kind, Some(name));
    }

    match msg.channel_id.to_channel(&ctx.http).await {
        Ok(Channel::Guild(ch)) => (channel_kind(ch.kind), Some(ch.name)),
        Ok(_) => (ChannelKind::Guild, None),
        Err(e) => {
            debug!(channel = %msg.channel_id, error = %e, "channel lookup failed");
            (ChannelKind::Guild, None)
        }
    }
}

/// Translate a reaction-add event. `None` when the reacting user is unknown.
pub fn reaction_added(reaction: &Reaction, bot: BotIdentity, author: Option<u64>) -> Option<ReactionAdded> {
    let actor = reaction.user_id?.get();
    Some(ReactionAdded {
        target: MessageRef::new(reaction.channel_id.get(), reaction.message_id.get()),
        target_author_is_self: author == Some(bot.user.0),
        actor: ActorRef(actor),
        actor_is_self: actor == bot.user.0,
        emoji: emoji_text(&reaction.emoji),
    })
}
