use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use calcu_core::{CalculationId, MessageRef};

use crate::error::EvalError;
use crate::expr::Expr;
use crate::number::Number;

/// How a successful result is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Fraction,
    Decimal,
}

impl DisplayMode {
    pub fn flipped(self) -> Self {
        match self {
            DisplayMode::Fraction => DisplayMode::Decimal,
            DisplayMode::Decimal => DisplayMode::Fraction,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Fraction => write!(f, "fraction"),
            DisplayMode::Decimal => write!(f, "decimal"),
        }
    }
}

/// Result half of a successful calculation.
#[derive(Debug, Clone)]
pub struct Evaluated {
    pub value: Number,
    pub parsed: Arc<Expr>,
    /// The bot's reply; set once the reply has been sent.
    pub response: Option<MessageRef>,
    pub display_mode: DisplayMode,
    /// Number of times the display mode has been flipped.
    pub toggles: u32,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Success(Evaluated),
    Failure(EvalError),
}

/// One evaluation attempt.
#[derive(Debug, Clone)]
pub struct Calculation {
    pub id: CalculationId,
    /// The message that asked for the calculation.
    pub source: MessageRef,
    pub expression: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
}

impl Calculation {
    pub fn succeeded(
        source: MessageRef,
        expression: impl Into<String>,
        timestamp: DateTime<Utc>,
        value: Number,
        parsed: Expr,
    ) -> Self {
        Self {
            id: CalculationId::new(),
            source,
            expression: expression.into(),
            timestamp,
            outcome: Outcome::Success(Evaluated {
                value,
                parsed: Arc::new(parsed),
                response: None,
                display_mode: DisplayMode::Fraction,
                toggles: 0,
            }),
        }
    }

    pub fn failed(
        source: MessageRef,
        expression: impl Into<String>,
        timestamp: DateTime<Utc>,
        error: EvalError,
    ) -> Self {
        Self {
            id: CalculationId::new(),
            source,
            expression: expression.into(),
            timestamp,
            outcome: Outcome::Failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn value(&self) -> Option<Number> {
        match &self.outcome {
            Outcome::Success(e) => Some(e.value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn parsed(&self) -> Option<&Expr> {
        match &self.outcome {
            Outcome::Success(e) => Some(e.parsed.as_ref()),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&EvalError> {
        match &self.outcome {
            Outcome::Failure(e) => Some(e),
            Outcome::Success(_) => None,
        }
    }

    pub fn response(&self) -> Option<MessageRef> {
        match &self.outcome {
            Outcome::Success(e) => e.response,
            Outcome::Failure(_) => None,
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        match &self.outcome {
            Outcome::Success(e) => e.display_mode,
            Outcome::Failure(_) => DisplayMode::Fraction,
        }
    }

    /// Record the reply message. No-op on a failed calculation.
    pub fn deliver(&mut self, response: MessageRef) {
        if let Outcome::Success(e) = &mut self.outcome {
            e.response = Some(response);
        }
    }

    /// Whether a toggle control belongs on the reply.
    pub fn has_toggle(&self) -> bool {
        self.value().is_some_and(|v| v.display_as_fraction())
    }

    /// Only the session store calls this; see `store::CalculationGuard`.
    pub(crate) fn set_display_mode(&mut self, mode: DisplayMode) {
        if let Outcome::Success(e) = &mut self.outcome {
            if e.display_mode != mode {
                e.display_mode = mode;
                e.toggles += 1;
            }
        }
    }

    pub fn toggles(&self) -> u32 {
        match &self.outcome {
            Outcome::Success(e) => e.toggles,
            Outcome::Failure(_) => 0,
        }
    }
}
