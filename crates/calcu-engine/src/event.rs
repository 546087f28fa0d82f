//! Inbound chat events, already translated out of the transport's own types.

use chrono::{DateTime, Utc};

use calcu_core::{ActorRef, ChannelKind, ChannelRef, MessageRef};

/// Who the bot is on the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotIdentity {
    pub user: ActorRef,
}

impl BotIdentity {
    pub fn new(user_id: u64) -> Self {
        Self {
            user: ActorRef(user_id),
        }
    }

    /// Every textual form the bot's mention token can take.
    pub fn mention_tokens(&self) -> [String; 2] {
        [format!("<@{}>", self.user), format!("<@!{}>", self.user)]
    }

    pub fn is_mentioned_in(&self, text: &str) -> bool {
        self.mention_tokens().iter().any(|t| text.contains(t.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct MessageReceived {
    pub id: MessageRef,
    pub author: ActorRef,
    /// False for bots, webhooks, and system messages.
    pub author_is_human: bool,
    pub content: String,
    pub mentions_bot: bool,
    pub channel: ChannelRef,
    pub channel_kind: ChannelKind,
    /// Guild channel name; `None` for DMs or when it could not be resolved.
    pub channel_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReactionAdded {
    pub target: MessageRef,
    pub target_author_is_self: bool,
    pub actor: ActorRef,
    pub actor_is_self: bool,
    pub emoji: String,
}
