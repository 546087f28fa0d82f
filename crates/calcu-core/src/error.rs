use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcuError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No bot token configured")]
    NoToken,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalcuError {
    /// Short error code string used in structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            CalcuError::Config(_) => "CONFIG_ERROR",
            CalcuError::NoToken => "NO_TOKEN",
            CalcuError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CalcuError>;
