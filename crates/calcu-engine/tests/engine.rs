use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use calcu_core::{ActorRef, CalcuConfig, ChannelKind, ChannelRef, MessageRef};
use calcu_engine::reaction::IgnoreReason;
use calcu_engine::resolver::RejectReason;
use calcu_engine::{
    BotIdentity, ChatTransport, DisplayMode, Engine, EvalError, MessageOutcome, MessageReceived,
    ReactionAdded, ReactionOutcome, SessionContext, TransportError,
};

const BOT: u64 = 999;
const HUMAN: u64 = 7;
const CHANNEL: u64 = 42;
const ACK: &str = "✅";
const NACK: &str = "❌";
const TOGGLE: &str = "🔁";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Reply { to: MessageRef, content: String },
    Edit { message: MessageRef, content: String },
    React { message: MessageRef, emoji: String },
    Unreact { message: MessageRef, emoji: String, actor: ActorRef },
}

/// In-memory transport that records every call and tracks reactions.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
    reactions: Mutex<HashMap<(MessageRef, String), Vec<ActorRef>>>,
    previous: Mutex<Option<MessageReceived>>,
    next_id: AtomicU64,
    fail_reply: bool,
    fail_edit: bool,
    /// Edits of this message park until `release` is notified.
    hold_edits: Mutex<Option<MessageRef>>,
    edit_parked: Notify,
    release: Notify,
}

impl Recorder {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn holders(&self, message: MessageRef, emoji: &str) -> Vec<ActorRef> {
        self.reactions
            .lock()
            .unwrap()
            .get(&(message, emoji.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn human_reacts(&self, message: MessageRef, emoji: &str, actor: u64) {
        self.reactions
            .lock()
            .unwrap()
            .entry((message, emoji.to_string()))
            .or_default()
            .push(ActorRef(actor));
    }

    fn last_edit(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::Edit { content, .. } => Some(content),
            _ => None,
        })
    }
}

#[async_trait]
impl ChatTransport for Recorder {
    async fn reply_to(&self, message: MessageRef, content: &str) -> Result<MessageRef, TransportError> {
        if self.fail_reply {
            return Err(TransportError::SendFailed("offline".to_string()));
        }
        self.calls.lock().unwrap().push(Call::Reply {
            to: message,
            content: content.to_string(),
        });
        let id = 10_000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(MessageRef::new(message.channel.0, id))
    }

    async fn edit_message(&self, message: MessageRef, content: &str) -> Result<(), TransportError> {
        if self.fail_edit {
            return Err(TransportError::EditFailed("offline".to_string()));
        }
        let held = *self.hold_edits.lock().unwrap() == Some(message);
        if held {
            self.edit_parked.notify_one();
            self.release.notified().await;
        }
        self.calls.lock().unwrap().push(Call::Edit {
            message,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn add_reaction(&self, message: MessageRef, emoji: &str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Call::React {
            message,
            emoji: emoji.to_string(),
        });
        self.reactions
            .lock()
            .unwrap()
            .entry((message, emoji.to_string()))
            .or_default()
            .push(ActorRef(BOT));
        Ok(())
    }

    async fn remove_reaction(
        &self,
        message: MessageRef,
        emoji: &str,
        actor: ActorRef,
    ) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Call::Unreact {
            message,
            emoji: emoji.to_string(),
            actor,
        });
        if let Some(holders) = self
            .reactions
            .lock()
            .unwrap()
            .get_mut(&(message, emoji.to_string()))
        {
            holders.retain(|a| *a != actor);
        }
        Ok(())
    }

    async fn reactors(&self, message: MessageRef, emoji: &str) -> Result<Vec<ActorRef>, TransportError> {
        Ok(self.holders(message, emoji))
    }

    async fn fetch_previous_message(
        &self,
        _channel: ChannelRef,
        _before: MessageRef,
    ) -> Result<Option<MessageReceived>, TransportError> {
        Ok(self.previous.lock().unwrap().clone())
    }
}

fn engine() -> Engine {
    let config = CalcuConfig::default();
    let session = Arc::new(SessionContext::new(config.engine.session_capacity));
    Engine::new(session, &config, BotIdentity::new(BOT))
}

fn mention(id: u64, expression: &str) -> MessageReceived {
    MessageReceived {
        id: MessageRef::new(CHANNEL, id),
        author: ActorRef(HUMAN),
        author_is_human: true,
        content: format!("<@{BOT}> {expression}"),
        mentions_bot: true,
        channel: ChannelRef(CHANNEL),
        channel_kind: ChannelKind::Guild,
        channel_name: Some("general".to_string()),
        timestamp: Utc::now(),
    }
}

fn toggle_by(target: MessageRef, actor: u64) -> ReactionAdded {
    ReactionAdded {
        target,
        target_author_is_self: true,
        actor: ActorRef(actor),
        actor_is_self: actor == BOT,
        emoji: TOGGLE.to_string(),
    }
}

fn calculated(outcome: MessageOutcome) -> (MessageRef, f64) {
    match outcome {
        MessageOutcome::Calculated { response, value } => (response, value.value()),
        other => panic!("expected a calculation, got {other:?}"),
    }
}

#[tokio::test]
async fn simple_sum_acks_and_advances_ans() {
    let engine = engine();
    let transport = Recorder::default();
    let trigger = mention(1, "2+2");

    let (response, value) = calculated(engine.on_message(&transport, trigger.clone()).await.unwrap());

    assert_eq!(value, 4.0);
    assert_eq!(engine.session().ans.get().value(), 4.0);
    assert_eq!(
        transport.calls(),
        vec![
            Call::Reply {
                to: trigger.id,
                content: "4".to_string()
            },
            Call::React {
                message: trigger.id,
                emoji: ACK.to_string()
            },
        ]
    );
    // Integers get no toggle control.
    assert!(transport.holders(response, TOGGLE).is_empty());
}

#[tokio::test]
async fn ans_chains_across_triggers() {
    let engine = engine();
    let transport = Recorder::default();

    calculated(engine.on_message(&transport, mention(1, "2+2")).await.unwrap());
    let (_, value) = calculated(engine.on_message(&transport, mention(2, "ans*3")).await.unwrap());

    assert_eq!(value, 12.0);
    assert_eq!(engine.session().ans.get().value(), 12.0);
}

#[tokio::test]
async fn failure_nacks_and_leaves_ans_alone() {
    let engine = engine();
    let transport = Recorder::default();
    calculated(engine.on_message(&transport, mention(1, "2+2")).await.unwrap());

    let trigger = mention(2, "1/0");
    let outcome = engine.on_message(&transport, trigger.clone()).await.unwrap();

    assert_eq!(outcome, MessageOutcome::Failed(EvalError::NotFinite));
    assert_eq!(engine.session().ans.get().value(), 4.0);
    assert_eq!(
        transport.calls().last(),
        Some(&Call::React {
            message: trigger.id,
            emoji: NACK.to_string()
        })
    );
    assert_eq!(engine.session().store.len(), 1);
}

#[tokio::test]
async fn toggle_flips_presentation_and_keeps_a_single_control() {
    let engine = engine();
    let transport = Recorder::default();

    let (response, _) = calculated(engine.on_message(&transport, mention(1, "1/3")).await.unwrap());
    assert!(transport.calls().contains(&Call::Reply {
        to: MessageRef::new(CHANNEL, 1),
        content: "1/3".to_string()
    }));
    assert_eq!(transport.holders(response, TOGGLE), vec![ActorRef(BOT)]);

    transport.human_reacts(response, TOGGLE, HUMAN);
    let outcome = engine.on_reaction(&transport, toggle_by(response, HUMAN)).await.unwrap();
    assert_eq!(
        outcome,
        ReactionOutcome::Toggled {
            mode: DisplayMode::Decimal,
            retracted: 1
        }
    );
    assert_eq!(transport.last_edit().as_deref(), Some("0.3333333333"));
    assert_eq!(transport.holders(response, TOGGLE), vec![ActorRef(BOT)]);

    transport.human_reacts(response, TOGGLE, HUMAN);
    let outcome = engine.on_reaction(&transport, toggle_by(response, HUMAN)).await.unwrap();
    assert!(matches!(
        outcome,
        ReactionOutcome::Toggled {
            mode: DisplayMode::Fraction,
            ..
        }
    ));
    assert_eq!(transport.last_edit().as_deref(), Some("1/3"));
    assert_eq!(transport.holders(response, TOGGLE), vec![ActorRef(BOT)]);
}

#[tokio::test]
async fn bot_reaction_is_ignored() {
    let engine = engine();
    let transport = Recorder::default();
    let (response, _) = calculated(engine.on_message(&transport, mention(1, "1/3")).await.unwrap());
    let before = transport.calls().len();

    let outcome = engine.on_reaction(&transport, toggle_by(response, BOT)).await.unwrap();

    assert_eq!(outcome, ReactionOutcome::Ignored(IgnoreReason::OwnReaction));
    assert_eq!(transport.calls().len(), before);
    let stored = engine.session().store.find_by_response(&response).await.unwrap();
    assert_eq!(stored.display_mode(), DisplayMode::Fraction);
}

#[tokio::test]
async fn reaction_on_unknown_message_is_ignored() {
    let engine = engine();
    let transport = Recorder::default();

    let outcome = engine
        .on_reaction(&transport, toggle_by(MessageRef::new(CHANNEL, 123), HUMAN))
        .await
        .unwrap();

    assert_eq!(outcome, ReactionOutcome::Ignored(IgnoreReason::UnknownTarget));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn bare_mention_computes_previous_message() {
    let engine = engine();
    let transport = Recorder::default();
    let mut previous = mention(1, "");
    previous.content = "6*7".to_string();
    previous.mentions_bot = false;
    *transport.previous.lock().unwrap() = Some(previous.clone());

    let trigger = mention(2, "");
    let (_, value) = calculated(engine.on_message(&transport, trigger.clone()).await.unwrap());

    assert_eq!(value, 42.0);
    assert_eq!(
        transport.calls(),
        vec![
            Call::Reply {
                to: previous.id,
                content: "42".to_string()
            },
            Call::React {
                message: trigger.id,
                emoji: ACK.to_string()
            },
        ]
    );
}

#[tokio::test]
async fn bare_mention_after_bot_message_is_rejected() {
    let engine = engine();
    let transport = Recorder::default();
    let mut previous = mention(1, "");
    previous.content = "1+1".to_string();
    previous.author_is_human = false;
    *transport.previous.lock().unwrap() = Some(previous);

    let outcome = engine.on_message(&transport, mention(2, "")).await.unwrap();

    assert_eq!(outcome, MessageOutcome::Ignored(RejectReason::PreviousNotHuman));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn unaddressed_message_is_ignored() {
    let engine = engine();
    let transport = Recorder::default();
    let mut msg = mention(1, "2+2");
    msg.content = "2+2".to_string();
    msg.mentions_bot = false;

    let outcome = engine.on_message(&transport, msg).await.unwrap();

    assert_eq!(outcome, MessageOutcome::Ignored(RejectReason::NotAddressed));
    assert_eq!(engine.session().ans.get().value(), 0.0);
}

#[tokio::test]
async fn failed_reply_abandons_the_calculation() {
    let engine = engine();
    let transport = Recorder {
        fail_reply: true,
        ..Recorder::default()
    };
    let trigger = mention(1, "1/3");

    let result = engine.on_message(&transport, trigger.clone()).await;

    assert!(matches!(result, Err(TransportError::SendFailed(_))));
    assert_eq!(engine.session().ans.get().value(), 0.0);
    assert!(engine.session().store.is_empty());
    assert_eq!(
        transport.calls(),
        vec![Call::React {
            message: trigger.id,
            emoji: NACK.to_string()
        }]
    );
}

#[tokio::test]
async fn failed_edit_keeps_display_mode() {
    let engine = engine();
    let ok = Recorder::default();
    let (response, _) = calculated(engine.on_message(&ok, mention(1, "1/4")).await.unwrap());

    let broken = Recorder {
        fail_edit: true,
        ..Recorder::default()
    };
    let result = engine.on_reaction(&broken, toggle_by(response, HUMAN)).await;

    assert!(matches!(result, Err(TransportError::EditFailed(_))));
    let stored = engine.session().store.find_by_response(&response).await.unwrap();
    assert_eq!(stored.display_mode(), DisplayMode::Fraction);
}

#[tokio::test]
async fn toggles_serialise_per_message_but_not_across_messages() {
    let engine = Arc::new(engine());
    let transport = Arc::new(Recorder::default());
    let (held, _) = calculated(engine.on_message(transport.as_ref(), mention(1, "1/3")).await.unwrap());
    let (other, _) = calculated(engine.on_message(transport.as_ref(), mention(2, "1/4")).await.unwrap());

    *transport.hold_edits.lock().unwrap() = Some(held);
    let spawn_toggle = |actor: u64| {
        let (engine, transport) = (Arc::clone(&engine), Arc::clone(&transport));
        tokio::spawn(async move { engine.on_reaction(transport.as_ref(), toggle_by(held, actor)).await })
    };

    let first = spawn_toggle(HUMAN);
    transport.edit_parked.notified().await;
    let second = spawn_toggle(HUMAN + 1);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!second.is_finished(), "second toggle must wait for the first");

    // A different message is not blocked by the parked edit.
    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        engine.on_reaction(transport.as_ref(), toggle_by(other, HUMAN)),
    )
    .await
    .expect("toggle on another message was blocked")
    .unwrap();
    assert!(matches!(outcome, ReactionOutcome::Toggled { mode: DisplayMode::Decimal, .. }));

    *transport.hold_edits.lock().unwrap() = None;
    transport.release.notify_one();
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert!(matches!(first, ReactionOutcome::Toggled { mode: DisplayMode::Decimal, .. }));
    assert!(matches!(second, ReactionOutcome::Toggled { mode: DisplayMode::Fraction, .. }));

    let edits: Vec<String> = transport
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Edit { message, content } if message == held => Some(content),
            _ => None,
        })
        .collect();
    assert_eq!(edits, vec!["0.3333333333".to_string(), "1/3".to_string()]);

    let stored = engine.session().store.find_by_response(&held).await.unwrap();
    assert_eq!(stored.display_mode(), DisplayMode::Fraction);
    assert_eq!(stored.toggles(), 2);
}
