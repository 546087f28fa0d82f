//! Calculation engine: trigger resolution, evaluation with a running `ans`
//! register, response correlation, and the reaction toggle protocol.
//!
//! Everything here is transport-agnostic. Chat adapters feed
//! [`event::MessageReceived`] / [`event::ReactionAdded`] into an [`Engine`]
//! and implement [`ChatTransport`] for the outbound side.

pub mod ans;
pub mod calculation;
pub mod engine;
pub mod error;
pub mod event;
pub mod expr;
pub mod number;
pub mod pipeline;
pub mod presentation;
pub mod reaction;
pub mod resolver;
pub mod session;
pub mod store;
pub mod transport;

pub use calculation::{Calculation, DisplayMode};
pub use engine::{Engine, MessageOutcome, ReactionOutcome};
pub use error::{EvalError, StoreError, TransportError};
pub use event::{BotIdentity, MessageReceived, ReactionAdded};
pub use number::Number;
pub use session::SessionContext;
pub use transport::{ChatTransport, Reaction, ReactionSet};
