//! Reaction toggle protocol.
//!
//! Pure decisions only. [`screen`] filters raw reaction events, [`decide`]
//! computes the next display mode and its rendering, and [`retractions`]
//! lists whose toggle reactions must go so the control behaves as one
//! shared button. The engine applies the resulting effects.

use calcu_core::ActorRef;

use crate::calculation::{Calculation, DisplayMode};
use crate::event::ReactionAdded;
use crate::presentation;
use crate::transport::ReactionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The bot's own reaction, including the toggle it attaches itself.
    OwnReaction,
    /// The reacted-to message was not posted by the bot.
    ForeignMessage,
    NotToggle,
    /// No stored calculation answers to the message (never stored, or evicted).
    UnknownTarget,
    /// The result has a single presentation, so there is nothing to flip.
    NoAlternate,
}

/// Where a calculation sits in the toggle protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    /// The alternate presentation has never been shown.
    Unrevealed,
    Toggled,
}

pub fn state(calculation: &Calculation) -> ToggleState {
    if calculation.toggles() == 0 {
        ToggleState::Unrevealed
    } else {
        ToggleState::Toggled
    }
}

/// The effect of one accepted toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub mode: DisplayMode,
    pub presentation: String,
}

/// Filter a reaction before any lookup.
pub fn screen(event: &ReactionAdded, reactions: &ReactionSet) -> Result<(), IgnoreReason> {
    if event.actor_is_self {
        return Err(IgnoreReason::OwnReaction);
    }
    if !event.target_author_is_self {
        return Err(IgnoreReason::ForeignMessage);
    }
    if !reactions.is_toggle(&event.emoji) {
        return Err(IgnoreReason::NotToggle);
    }
    Ok(())
}

/// Next mode and its rendering for `calculation`.
pub fn decide(calculation: &Calculation) -> Result<Toggle, IgnoreReason> {
    if !calculation.has_toggle() {
        return Err(IgnoreReason::NoAlternate);
    }
    let value = calculation.value().ok_or(IgnoreReason::NoAlternate)?;
    let mode = calculation.display_mode().flipped();
    Ok(Toggle {
        mode,
        presentation: presentation::render(&value, mode),
    })
}

/// Everyone holding the toggle except the bot.
pub fn retractions(reactors: &[ActorRef], bot: ActorRef) -> Vec<ActorRef> {
    reactors.iter().copied().filter(|actor| *actor != bot).collect()
}
