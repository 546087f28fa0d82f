//! Async driver tying the pure steps to a [`ChatTransport`].
//!
//! A successful trigger runs: evaluate, reply, ack, attach the toggle
//! control, advance `ans`, store. A toggle reaction runs: screen, look up,
//! flip, edit, retract the other toggles. All I/O for one reaction happens
//! while the stored calculation is locked.

use std::sync::Arc;

use tracing::{debug, info, warn};

use calcu_core::{CalcuConfig, MessageRef};

use crate::calculation::{Calculation, DisplayMode, Outcome};
use crate::error::{EvalError, TransportError};
use crate::event::{BotIdentity, MessageReceived, ReactionAdded};
use crate::expr::Environment;
use crate::number::Number;
use crate::pipeline::Pipeline;
use crate::presentation;
use crate::reaction::{self, IgnoreReason};
use crate::resolver::{RejectReason, Resolution, TriggerPolicy, TriggerRequest};
use crate::session::SessionContext;
use crate::transport::{ChatTransport, Reaction, ReactionSet};

/// What became of an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    Ignored(RejectReason),
    /// Evaluation failed; the trigger got a nack.
    Failed(EvalError),
    Calculated { response: MessageRef, value: Number },
}

/// What became of an inbound reaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionOutcome {
    Ignored(IgnoreReason),
    Toggled { mode: DisplayMode, retracted: usize },
}

pub struct Engine {
    session: Arc<SessionContext>,
    pipeline: Pipeline,
    policy: TriggerPolicy,
    reactions: ReactionSet,
}

impl Engine {
    pub fn new(session: Arc<SessionContext>, config: &CalcuConfig, bot: BotIdentity) -> Self {
        let env = Environment::builtin().with_constants(&config.evaluator.constants);
        Self {
            session,
            pipeline: Pipeline::new(env, &config.engine),
            policy: TriggerPolicy::new(
                bot,
                config.discord.trigger_channel.clone(),
                config.discord.dm_allowed,
            ),
            reactions: ReactionSet::from(&config.reactions),
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn bot(&self) -> BotIdentity {
        self.policy.bot()
    }

    /// Handle a message event.
    ///
    /// `Err` means a transport call failed. If that happened after a
    /// successful evaluation the calculation was abandoned: a nack was
    /// attempted, `ans` was left alone and nothing was stored.
    pub async fn on_message(
        &self,
        transport: &dyn ChatTransport,
        msg: MessageReceived,
    ) -> Result<MessageOutcome, TransportError> {
        let request = match self.policy.resolve(&msg) {
            Resolution::Trigger(request) => request,
            Resolution::Rejected(reason) => return Ok(MessageOutcome::Ignored(reason)),
            Resolution::NeedsPrevious => {
                let previous = transport.fetch_previous_message(msg.channel, msg.id).await?;
                match self.policy.resolve_fallback(&msg, previous.as_ref()) {
                    Ok(request) => request,
                    Err(reason) => return Ok(MessageOutcome::Ignored(reason)),
                }
            }
        };

        let ans = self.session.ans.get();
        let mut calculation = self
            .pipeline
            .evaluate(request.react_to, &request.expression, msg.timestamp, ans)
            .await;

        let value = match &calculation.outcome {
            Outcome::Success(evaluated) => evaluated.value,
            Outcome::Failure(error) => {
                let error = error.clone();
                transport
                    .add_reaction(request.react_to, self.reactions.glyph(Reaction::Nack))
                    .await?;
                return Ok(MessageOutcome::Failed(error));
            }
        };

        let response = match self.deliver(transport, &request, &calculation, &value).await {
            Ok(response) => response,
            Err(e) => {
                warn!(calc = %calculation.id, error = %e, "delivery failed, abandoning calculation");
                if let Err(nack_err) = transport
                    .add_reaction(request.react_to, self.reactions.glyph(Reaction::Nack))
                    .await
                {
                    debug!(calc = %calculation.id, error = %nack_err, "nack after failed delivery also failed");
                }
                return Err(e);
            }
        };

        self.session.ans.set(value);
        calculation.deliver(response);
        let id = calculation.id;
        if let Err(e) = self.session.store.append(calculation) {
            warn!(calc = %id, error = %e, "calculation not stored");
        }

        info!(calc = %id, expression = %request.expression, value = %value, "calculated");
        Ok(MessageOutcome::Calculated { response, value })
    }

    /// Reply, ack, and attach the toggle control when the value has two
    /// presentations.
    async fn deliver(
        &self,
        transport: &dyn ChatTransport,
        request: &TriggerRequest,
        calculation: &Calculation,
        value: &Number,
    ) -> Result<MessageRef, TransportError> {
        let text = presentation::render(value, calculation.display_mode());
        let response = transport.reply_to(request.reply_to, &text).await?;
        transport
            .add_reaction(request.react_to, self.reactions.glyph(Reaction::Ack))
            .await?;
        if calculation.has_toggle() {
            transport
                .add_reaction(response, self.reactions.glyph(Reaction::Toggle))
                .await?;
        }
        Ok(response)
    }

    /// Handle a reaction-add event.
    ///
    /// A failed edit leaves the display mode unchanged so stored state keeps
    /// matching the visible message. Failures while retracting other users'
    /// toggles are logged and skipped.
    pub async fn on_reaction(
        &self,
        transport: &dyn ChatTransport,
        event: ReactionAdded,
    ) -> Result<ReactionOutcome, TransportError> {
        if let Err(reason) = reaction::screen(&event, &self.reactions) {
            return Ok(ReactionOutcome::Ignored(reason));
        }
        let Some(slot) = self.session.store.slot(&event.target) else {
            debug!(response = %event.target, "reaction on unknown calculation");
            return Ok(ReactionOutcome::Ignored(IgnoreReason::UnknownTarget));
        };

        let mut calculation = slot.lock().await;
        debug!(calc = %calculation.id, state = ?reaction::state(&calculation), "toggle requested");
        let toggle = match reaction::decide(&calculation) {
            Ok(toggle) => toggle,
            Err(reason) => return Ok(ReactionOutcome::Ignored(reason)),
        };

        // The entry stays locked, so committing the mode after the edit is
        // indistinguishable from flipping first.
        transport
            .edit_message(event.target, &toggle.presentation)
            .await?;
        self.session
            .store
            .update_display_mode(&mut calculation, toggle.mode);

        let toggle_glyph = self.reactions.glyph(Reaction::Toggle);
        let reactors = match transport.reactors(event.target, toggle_glyph).await {
            Ok(reactors) => reactors,
            Err(e) => {
                warn!(calc = %calculation.id, error = %e, "could not list toggle reactors");
                vec![event.actor]
            }
        };

        let mut retracted = 0;
        for actor in reaction::retractions(&reactors, self.policy.bot().user) {
            match transport.remove_reaction(event.target, toggle_glyph, actor).await {
                Ok(()) => retracted += 1,
                Err(e) => warn!(calc = %calculation.id, actor = %actor, error = %e, "toggle retraction failed"),
            }
        }

        debug!(calc = %calculation.id, mode = %toggle.mode, retracted, "toggled");
        Ok(ReactionOutcome::Toggled {
            mode: toggle.mode,
            retracted,
        })
    }
}
