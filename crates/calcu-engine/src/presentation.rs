use crate::calculation::DisplayMode;
use crate::number::Number;

/// Render a result for display. Pure: same inputs, same text.
///
/// `Fraction` falls back to the decimal form when the value has no ratio,
/// so such values look identical in both modes.
pub fn render(value: &Number, mode: DisplayMode) -> String {
    match mode {
        DisplayMode::Decimal => value.as_decimal(),
        DisplayMode::Fraction => value.as_fraction(),
    }
}
