//! Trigger resolution. Decides whether a message asks for a calculation
//! and, if so, what gets evaluated and where the reply and reaction go.
//!
//! Split into pure steps so the only I/O (fetching the previous message for
//! a bare mention) stays with the caller:
//!
//! 1. [`TriggerPolicy::resolve`]: eligibility and extraction.
//! 2. On [`Resolution::NeedsPrevious`], the caller fetches the preceding
//!    message and calls [`TriggerPolicy::resolve_fallback`].

use calcu_core::MessageRef;

use crate::event::{BotIdentity, MessageReceived};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    pub expression: String,
    /// Message the textual reply is attached to.
    pub reply_to: MessageRef,
    /// Message that receives the ack/nack reaction.
    pub react_to: MessageRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotHuman,
    NotAddressed,
    NoPreviousMessage,
    PreviousNotHuman,
    PreviousMentionsBot,
    PreviousEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Trigger(TriggerRequest),
    /// The message was a bare mention; the preceding message supplies the expression.
    NeedsPrevious,
    Rejected(RejectReason),
}

#[derive(Debug, Clone)]
pub struct TriggerPolicy {
    bot: BotIdentity,
    trigger_channel: String,
    dm_allowed: bool,
}

impl TriggerPolicy {
    pub fn new(bot: BotIdentity, trigger_channel: impl Into<String>, dm_allowed: bool) -> Self {
        Self {
            bot,
            trigger_channel: trigger_channel.into(),
            dm_allowed,
        }
    }

    pub fn bot(&self) -> BotIdentity {
        self.bot
    }

    /// Mention, keyword channel, or DM. Non-human authors never qualify.
    pub fn eligible(&self, msg: &MessageReceived) -> Result<(), RejectReason> {
        if !msg.author_is_human {
            return Err(RejectReason::NotHuman);
        }
        let keyword_channel = msg
            .channel_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(&self.trigger_channel));
        let direct = self.dm_allowed && msg.channel_kind.is_direct();

        if msg.mentions_bot || keyword_channel || direct {
            Ok(())
        } else {
            Err(RejectReason::NotAddressed)
        }
    }

    pub fn resolve(&self, msg: &MessageReceived) -> Resolution {
        if let Err(reason) = self.eligible(msg) {
            return Resolution::Rejected(reason);
        }

        let expression = self.extract(&msg.content);
        if expression.is_empty() {
            return Resolution::NeedsPrevious;
        }

        Resolution::Trigger(TriggerRequest {
            expression,
            reply_to: msg.id,
            react_to: msg.id,
        })
    }

    /// Second step for a bare mention: compute what `previous` holds, reply
    /// to it, and react on the triggering message.
    pub fn resolve_fallback(
        &self,
        trigger: &MessageReceived,
        previous: Option<&MessageReceived>,
    ) -> Result<TriggerRequest, RejectReason> {
        let previous = previous.ok_or(RejectReason::NoPreviousMessage)?;
        if !previous.author_is_human {
            return Err(RejectReason::PreviousNotHuman);
        }
        if previous.mentions_bot || self.bot.is_mentioned_in(&previous.content) {
            return Err(RejectReason::PreviousMentionsBot);
        }

        let expression = previous.content.trim();
        if expression.is_empty() {
            return Err(RejectReason::PreviousEmpty);
        }

        Ok(TriggerRequest {
            expression: expression.to_string(),
            reply_to: previous.id,
            react_to: trigger.id,
        })
    }

    /// Message text with every bot-mention token removed, trimmed.
    pub fn extract(&self, content: &str) -> String {
        let mut text = content.to_string();
        for token in self.bot.mention_tokens() {
            text = text.replace(&token, "");
        }
        text.trim().to_string()
    }
}
