//! Evaluation environment: named constants plus a fixed, arity-tagged
//! function table resolved once at startup and bound into a fresh
//! [`meval::Context`] for each evaluation.

use std::collections::BTreeMap;
use std::f64::consts::{E, PI};

/// Name under which the previous answer is bound.
pub const ANS: &str = "ans";

/// Names that configuration may not rebind.
const RESERVED: &[&str] = &[ANS, "pi", "e"];

/// Largest `n` for which `n!` is finite in `f64`.
pub const MAX_FACTORIAL: f64 = 170.0;

/// A built-in function, tagged with its arity.
#[derive(Debug, Clone, Copy)]
pub enum MathFn {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Ternary(fn(f64, f64, f64) -> f64),
}

impl MathFn {
    pub fn arity(&self) -> usize {
        match self {
            MathFn::Unary(_) => 1,
            MathFn::Binary(_) => 2,
            MathFn::Ternary(_) => 3,
        }
    }
}

/// Constants and functions shared by every evaluation.
///
/// `meval::Context` is not `Send`, so the environment keeps plain data
/// and builds a context on the evaluating thread.
#[derive(Debug, Clone)]
pub struct Environment {
    constants: BTreeMap<String, f64>,
    functions: BTreeMap<&'static str, MathFn>,
}

impl Environment {
    /// `pi`, `e` and the built-in function table.
    pub fn builtin() -> Self {
        let constants = BTreeMap::from([("pi".to_string(), PI), ("e".to_string(), E)]);

        let functions = BTreeMap::from([
            ("sin", MathFn::Unary(f64::sin)),
            ("cos", MathFn::Unary(f64::cos)),
            ("tan", MathFn::Unary(f64::tan)),
            ("asin", MathFn::Unary(f64::asin)),
            ("acos", MathFn::Unary(f64::acos)),
            ("atan", MathFn::Unary(f64::atan)),
            ("abs", MathFn::Unary(f64::abs)),
            ("sqrt", MathFn::Unary(f64::sqrt)),
            ("ln", MathFn::Unary(f64::ln)),
            ("factorial", MathFn::Unary(factorial)),
            ("log", MathFn::Binary(log)),
            ("P", MathFn::Binary(permutation)),
            ("C", MathFn::Binary(combination)),
            ("clamp", MathFn::Ternary(clamp)),
            ("quadratic", MathFn::Ternary(quadratic)),
        ]);

        Self {
            constants,
            functions,
        }
    }

    /// Add configured constants. Reserved names are skipped with a warning.
    pub fn with_constants<'a>(mut self, extra: impl IntoIterator<Item = (&'a String, &'a f64)>) -> Self {
        for (name, value) in extra {
            if RESERVED.contains(&name.as_str()) {
                tracing::warn!(name = %name, "ignoring configured constant with reserved name");
                continue;
            }
            self.constants.insert(name.clone(), *value);
        }
        self
    }

    /// Register an extra function, replacing any built-in of the same name.
    pub fn with_function(mut self, name: &'static str, function: MathFn) -> Self {
        self.functions.insert(name, function);
        self
    }

    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }

    pub fn arity(&self, name: &str) -> Option<usize> {
        self.functions.get(name).map(MathFn::arity)
    }

    /// A context holding exactly this environment with `ans` bound.
    pub fn context(&self, ans: f64) -> meval::Context<'static> {
        let mut ctx = meval::Context::empty();
        for (name, value) in &self.constants {
            ctx.var(name.clone(), *value);
        }
        ctx.var(ANS, ans);
        for (&name, function) in &self.functions {
            match *function {
                MathFn::Unary(f) => ctx.func(name, f),
                MathFn::Binary(f) => ctx.func2(name, f),
                MathFn::Ternary(f) => ctx.func3(name, f),
            };
        }
        ctx
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::builtin()
    }
}

// Invalid inputs yield NaN; the pipeline rejects non-finite results.
// Every loop below runs at most MAX_FACTORIAL times.

fn is_whole(x: f64) -> bool {
    x.is_finite() && x.fract() == 0.0 && x >= 0.0
}

fn factorial(n: f64) -> f64 {
    if !is_whole(n) || n > MAX_FACTORIAL {
        return f64::NAN;
    }
    (2..=n as u64).fold(1.0, |acc, k| acc * k as f64)
}

fn permutation(n: f64, r: f64) -> f64 {
    if !is_whole(n) || !is_whole(r) || n < r || n > MAX_FACTORIAL {
        return f64::NAN;
    }
    let (n, r) = (n as u64, r as u64);
    (n - r + 1..=n).fold(1.0, |acc, k| acc * k as f64)
}

fn combination(n: f64, r: f64) -> f64 {
    if !is_whole(n) || !is_whole(r) || n < r || n > MAX_FACTORIAL {
        return f64::NAN;
    }
    let (n, r) = (n as u64, r as u64);
    let r = r.min(n - r);
    (0..r).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64).round()
}

fn log(x: f64, base: f64) -> f64 {
    x.ln() / base.ln()
}

fn clamp(x: f64, min: f64, max: f64) -> f64 {
    if min > max || min.is_nan() || max.is_nan() {
        return f64::NAN;
    }
    x.clamp(min, max)
}

/// The `+` root of `ax² + bx + c = 0`.
fn quadratic(a: f64, b: f64, c: f64) -> f64 {
    let root = (b * b - 4.0 * a * c).sqrt();
    (-b + root) / (2.0 * a)
}
