use async_trait::async_trait;

use calcu_core::config::ReactionsConfig;
use calcu_core::{ActorRef, ChannelRef, MessageRef};

use crate::error::TransportError;
use crate::event::MessageReceived;

/// The fixed reaction vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Evaluation succeeded.
    Ack,
    /// Evaluation failed.
    Nack,
    /// Flip the display mode of a result.
    Toggle,
}

/// Glyphs for each [`Reaction`].
#[derive(Debug, Clone)]
pub struct ReactionSet {
    ack: String,
    nack: String,
    toggle: String,
}

impl ReactionSet {
    pub fn glyph(&self, reaction: Reaction) -> &str {
        match reaction {
            Reaction::Ack => &self.ack,
            Reaction::Nack => &self.nack,
            Reaction::Toggle => &self.toggle,
        }
    }

    pub fn is_toggle(&self, emoji: &str) -> bool {
        emoji == self.toggle
    }
}

impl From<&ReactionsConfig> for ReactionSet {
    fn from(config: &ReactionsConfig) -> Self {
        Self {
            ack: config.ack.clone(),
            nack: config.nack.clone(),
            toggle: config.toggle.clone(),
        }
    }
}

impl Default for ReactionSet {
    fn default() -> Self {
        Self::from(&ReactionsConfig::default())
    }
}

/// Outbound side of a chat platform.
///
/// Implementations perform exactly one remote call per method and never
/// retry; failures are reported, not recovered, by the engine.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post `content` as a reply to `message`, without pinging anyone.
    /// Returns the new message.
    async fn reply_to(&self, message: MessageRef, content: &str) -> Result<MessageRef, TransportError>;

    async fn edit_message(&self, message: MessageRef, content: &str) -> Result<(), TransportError>;

    async fn add_reaction(&self, message: MessageRef, emoji: &str) -> Result<(), TransportError>;

    async fn remove_reaction(
        &self,
        message: MessageRef,
        emoji: &str,
        actor: ActorRef,
    ) -> Result<(), TransportError>;

    /// Everyone currently holding `emoji` on `message`.
    async fn reactors(&self, message: MessageRef, emoji: &str) -> Result<Vec<ActorRef>, TransportError>;

    /// The message posted immediately before `before` in `channel`, if any.
    async fn fetch_previous_message(
        &self,
        channel: ChannelRef,
        before: MessageRef,
    ) -> Result<Option<MessageReceived>, TransportError>;
}
