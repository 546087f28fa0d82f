use thiserror::Error;

use calcu_core::MessageRef;

/// Any reason an expression did not produce a value.
///
/// Parse-time and evaluation-time problems share one type: callers only
/// ever see "the calculation failed".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("could not parse expression: {0}")]
    Syntax(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' takes {expected} argument(s)")]
    Arity { name: String, expected: usize },

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nested deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("expression longer than {max} characters")]
    TooLong { max: usize },

    #[error("evaluation timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("evaluation task aborted: {0}")]
    Aborted(String),
}

/// Failure of an outbound chat command.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Edit failed: {0}")]
    EditFailed(String),

    #[error("Reaction failed: {0}")]
    ReactionFailed(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// Only successful calculations with a response message are kept.
    #[error("calculation has not been delivered")]
    NotDelivered,

    #[error("response {0} is already tracked")]
    Duplicate(MessageRef),
}
