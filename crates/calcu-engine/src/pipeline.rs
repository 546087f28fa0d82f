//! Evaluation pipeline: binds `ans`, runs the evaluator under a timeout and
//! turns every failure into data.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use calcu_core::config::EngineConfig;
use calcu_core::MessageRef;

use crate::calculation::Calculation;
use crate::error::EvalError;
use crate::expr::{self, Environment, Expr};
use crate::number::Number;

pub struct Pipeline {
    env: Arc<Environment>,
    timeout: Duration,
    max_depth: usize,
    max_denominator: u64,
}

impl Pipeline {
    pub fn new(env: Environment, config: &EngineConfig) -> Self {
        Self {
            env: Arc::new(env),
            timeout: Duration::from_millis(config.evaluation_timeout_ms),
            max_depth: config.max_depth,
            max_denominator: config.max_denominator,
        }
    }

    /// Evaluate `expression` with `ans` bound, producing a successful or
    /// failed [`Calculation`]. Never touches the ans register.
    pub async fn evaluate(
        &self,
        source: MessageRef,
        expression: &str,
        timestamp: DateTime<Utc>,
        ans: Number,
    ) -> Calculation {
        match self.run(expression, ans).await {
            Ok((parsed, value)) => {
                Calculation::succeeded(source, expression, timestamp, value, parsed)
            }
            Err(error) => {
                debug!(expression, error = %error, "evaluation failed");
                Calculation::failed(source, expression, timestamp, error)
            }
        }
    }

    /// Run on the blocking pool so a slow expression never stalls the
    /// event loop. On timeout the worker is detached, not killed. Built-in
    /// functions loop at most `MAX_FACTORIAL` times and input length is
    /// capped, so a detached worker finishes soon after.
    async fn run(&self, expression: &str, ans: Number) -> Result<(Expr, Number), EvalError> {
        let env = Arc::clone(&self.env);
        let input = expression.to_string();
        let max_depth = self.max_depth;
        let max_denominator = self.max_denominator;

        let task = tokio::task::spawn_blocking(move || {
            expr::evaluate(&input, &env, ans.value(), max_depth)
                .map(|(parsed, value)| (parsed, Number::new(value, max_denominator)))
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(EvalError::Aborted(join_err.to_string())),
            Err(_) => Err(EvalError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
