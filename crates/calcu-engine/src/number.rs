//! Numeric results and their two renderings.
//!
//! A [`Number`] carries the raw `f64` plus, when one exists, a small exact
//! ratio that the value is indistinguishable from. The ratio is what makes a
//! fraction rendering "meaningful" and gates the toggle control.

use std::fmt;

/// Relative tolerance when matching a value against a convergent.
const TOLERANCE: f64 = 1e-9;
/// Continued-fraction terms examined before giving up.
const MAX_TERMS: usize = 64;
/// Largest magnitude for which an `f64` still has a fractional part worth rendering.
const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
/// Decimal places in the decimal rendering (trailing zeros trimmed).
const DECIMAL_PLACES: usize = 10;

/// An exact ratio `numer / denom`, `denom >= 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numer: i64,
    pub denom: u64,
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

/// A computed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number {
    value: f64,
    ratio: Option<Ratio>,
}

impl Number {
    /// Wrap `value`, searching for a ratio with a denominator up to `max_denominator`.
    pub fn new(value: f64, max_denominator: u64) -> Self {
        Self {
            value,
            ratio: approximate(value, max_denominator),
        }
    }

    pub fn zero() -> Self {
        Self {
            value: 0.0,
            ratio: None,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn ratio(&self) -> Option<Ratio> {
        self.ratio
    }

    /// True when the value has an exact ratio form distinct from its decimal form.
    pub fn display_as_fraction(&self) -> bool {
        self.ratio.is_some()
    }

    pub fn as_decimal(&self) -> String {
        format_decimal(self.value)
    }

    /// The ratio form, or the decimal form when there is none.
    pub fn as_fraction(&self) -> String {
        match self.ratio {
            Some(ratio) => ratio.to_string(),
            None => self.as_decimal(),
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_fraction())
    }
}

/// Best rational approximation by continued-fraction convergents.
///
/// Returns `None` for integers, non-finite values, and values with no
/// convergent inside `max_denominator` that matches within [`TOLERANCE`].
fn approximate(x: f64, max_denominator: u64) -> Option<Ratio> {
    if !x.is_finite() || x.fract() == 0.0 || x.abs() >= MAX_EXACT {
        return None;
    }

    let target = x.abs();
    let (mut h_prev, mut h) = (0u64, 1u64);
    let (mut k_prev, mut k) = (1u64, 0u64);
    let mut rest = target;

    for _ in 0..MAX_TERMS {
        let a = rest.floor();
        if a >= MAX_EXACT {
            break;
        }
        let a = a as u64;
        let h_next = a.checked_mul(h)?.checked_add(h_prev)?;
        let k_next = a.checked_mul(k)?.checked_add(k_prev)?;
        if k_next > max_denominator {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);

        if (h as f64 / k as f64 - target).abs() <= TOLERANCE * target.max(1.0) {
            // Matching with k == 1 means the value is an integer plus float noise.
            if k < 2 {
                return None;
            }
            let numer = i64::try_from(h).ok()?;
            return Some(Ratio {
                numer: if x < 0.0 { -numer } else { numer },
                denom: k,
            });
        }

        let frac = rest - a as f64;
        if frac <= f64::EPSILON {
            break;
        }
        rest = 1.0 / frac;
    }
    None
}

fn format_decimal(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-9..1e15).contains(&magnitude) {
        return format!("{:e}", value);
    }
    let fixed = format!("{:.*}", DECIMAL_PLACES, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
