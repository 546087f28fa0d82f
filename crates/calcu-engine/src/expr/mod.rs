//! Built-in arithmetic evaluator, backed by `meval`.

pub mod registry;

pub use meval::Expr;
pub use registry::{Environment, MathFn, ANS, MAX_FACTORIAL};

use meval::FuncEvalError;

use crate::error::EvalError;

/// Longest expression, in characters, the evaluator will accept.
pub const MAX_CHARS: usize = 4096;

/// Parse `input` after normalising the operator spellings chat users type.
pub fn parse(input: &str, max_depth: usize) -> Result<Expr, EvalError> {
    let input = normalize(input);
    check_shape(&input, max_depth)?;
    input.parse::<Expr>().map_err(|e| EvalError::Syntax(e.to_string()))
}

/// Parse and evaluate in one step. Non-finite results are errors.
pub fn evaluate(
    input: &str,
    env: &Environment,
    ans: f64,
    max_depth: usize,
) -> Result<(Expr, f64), EvalError> {
    let expr = parse(input, max_depth)?;
    let value = expr
        .eval_with_context(env.context(ans))
        .map_err(|e| classify(e, env))?;
    if !value.is_finite() {
        return Err(EvalError::NotFinite);
    }
    Ok((expr, value))
}

fn normalize(input: &str) -> String {
    input
        .trim()
        .replace("**", "^")
        .replace('\u{3c0}', "pi")
        .replace('\u{2212}', "-")
        .replace('\u{d7}', "*")
        .replace('\u{f7}', "/")
}

/// Length and parenthesis nesting limits, checked before parsing.
fn check_shape(input: &str, max_depth: usize) -> Result<(), EvalError> {
    if input.is_empty() {
        return Err(EvalError::Empty);
    }
    if input.chars().count() > MAX_CHARS {
        return Err(EvalError::TooLong { max: MAX_CHARS });
    }
    let mut depth = 0usize;
    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > max_depth {
                    return Err(EvalError::TooDeep { max: max_depth });
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn classify(err: meval::Error, env: &Environment) -> EvalError {
    match err {
        meval::Error::UnknownVariable(name) => EvalError::UnknownVariable(name),
        meval::Error::Function(name, FuncEvalError::UnknownFunction) => {
            EvalError::UnknownFunction(name)
        }
        meval::Error::Function(name, _) => EvalError::Arity {
            expected: env.arity(&name).unwrap_or_default(),
            name,
        },
        other => EvalError::Syntax(other.to_string()),
    }
}
