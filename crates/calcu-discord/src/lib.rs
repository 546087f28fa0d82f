pub mod adapter;
pub mod convert;
pub mod embed;
pub mod error;
pub mod handler;
pub mod presence;
pub mod transport;

pub use adapter::DiscordAdapter;
pub use error::DiscordError;
pub use transport::SerenityTransport;
