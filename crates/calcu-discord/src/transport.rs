use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::{CreateAllowedMentions, CreateMessage, EditMessage, GetMessages};
use serenity::http::Http;
use serenity::model::channel::ReactionType;
use serenity::model::id::{ChannelId, MessageId, UserId};

use calcu_core::{ActorRef, ChannelKind, ChannelRef, MessageRef};
use calcu_engine::{BotIdentity, ChatTransport, MessageReceived, TransportError};

use crate::{convert, embed};

/// Discord's cap on users returned per reaction page.
const REACTORS_PAGE: u8 = 100;

/// [`ChatTransport`] over Discord's REST API.
///
/// Only needs `Arc<Http>`, which stays valid across gateway reconnects.
pub struct SerenityTransport {
    http: Arc<Http>,
    bot: BotIdentity,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>, bot: BotIdentity) -> Self {
        Self { http, bot }
    }
}

fn ids(message: MessageRef) -> (ChannelId, MessageId) {
    (
        ChannelId::new(message.channel.0),
        MessageId::new(message.message_id),
    )
}

fn unicode(emoji: &str) -> ReactionType {
    ReactionType::Unicode(emoji.to_string())
}

#[async_trait]
impl ChatTransport for SerenityTransport {
    async fn reply_to(&self, message: MessageRef, content: &str) -> Result<MessageRef, TransportError> {
        let (channel_id, message_id) = ids(message);
        let reply = CreateMessage::new()
            .embed(embed::result_embed(content))
            .reference_message((channel_id, message_id))
            .allowed_mentions(CreateAllowedMentions::new().replied_user(false));

        let sent = channel_id
            .send_message(&self.http, reply)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(convert::message_ref(&sent))
    }

    async fn edit_message(&self, message: MessageRef, content: &str) -> Result<(), TransportError> {
        let (channel_id, message_id) = ids(message);
        channel_id
            .edit_message(
                &self.http,
                message_id,
                EditMessage::new().embed(embed::result_embed(content)),
            )
            .await
            .map(|_| ())
            .map_err(|e| TransportError::EditFailed(e.to_string()))
    }

    async fn add_reaction(&self, message: MessageRef, emoji: &str) -> Result<(), TransportError> {
        let (channel_id, message_id) = ids(message);
        self.http
            .create_reaction(channel_id, message_id, &unicode(emoji))
            .await
            .map_err(|e| TransportError::ReactionFailed(e.to_string()))
    }

    async fn remove_reaction(
        &self,
        message: MessageRef,
        emoji: &str,
        actor: ActorRef,
    ) -> Result<(), TransportError> {
        let (channel_id, message_id) = ids(message);
        self.http
            .delete_reaction(channel_id, message_id, UserId::new(actor.0), &unicode(emoji))
            .await
            .map_err(|e| TransportError::ReactionFailed(e.to_string()))
    }

    async fn reactors(&self, message: MessageRef, emoji: &str) -> Result<Vec<ActorRef>, TransportError> {
        let (channel_id, message_id) = ids(message);
        let reaction = unicode(emoji);
        let mut actors = Vec::new();
        let mut after = None;
        loop {
            let page = self
                .http
                .get_reaction_users(channel_id, message_id, &reaction, REACTORS_PAGE, after)
                .await
                .map_err(|e| TransportError::FetchFailed(e.to_string()))?;
            let full = page.len() == usize::from(REACTORS_PAGE);
            after = page.last().map(|u| u.id.get());
            actors.extend(page.into_iter().map(|u| ActorRef(u.id.get())));
            if !full {
                return Ok(actors);
            }
        }
    }

    /// Channel metadata is not resolved for fetched history; the engine
    /// only inspects author, mentions and content of the previous message.
    async fn fetch_previous_message(
        &self,
        channel: ChannelRef,
        before: MessageRef,
    ) -> Result<Option<MessageReceived>, TransportError> {
        let messages = ChannelId::new(channel.0)
            .messages(
                &self.http,
                GetMessages::new()
                    .before(MessageId::new(before.message_id))
                    .limit(1),
            )
            .await
            .map_err(|e| TransportError::FetchFailed(e.to_string()))?;

        Ok(messages
            .first()
            .map(|msg| convert::message_received(msg, self.bot, ChannelKind::default(), None)))
    }
}
