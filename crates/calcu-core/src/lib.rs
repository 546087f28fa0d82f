pub mod config;
pub mod error;
pub mod types;

pub use config::CalcuConfig;
pub use error::{CalcuError, Result};
pub use types::{ActorRef, CalculationId, ChannelKind, ChannelRef, MessageRef};
