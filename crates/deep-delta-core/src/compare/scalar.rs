//! Value-like equality for scalars: strings, floats and decimals.

use rust_decimal::Decimal;

use crate::types::options::{ComparisonOptions, StringComparison};

/// Case-folded string equality using Unicode simple case folding.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    let mut left = a.chars().flat_map(char::to_lowercase);
    let mut right = b.chars().flat_map(char::to_lowercase);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => continue,
            _ => return false,
        }
    }
}

/// String equality under the configured comparison mode.
///
/// Ordinal modes compare code units; the ignore-case variants fold case
/// first. Invariant and current-culture modes collate like ordinal.
pub fn strings_equal(a: &str, b: &str, comparison: StringComparison) -> bool {
    if comparison.ignores_case() {
        eq_ignore_case(a, b)
    } else {
        a == b
    }
}

/// `f32` equality: NaN handling first, then epsilon, then IEEE equality.
pub fn f32_equal(a: f32, b: f32, options: &ComparisonOptions) -> bool {
    if a.is_nan() || b.is_nan() {
        return options.treat_nan_equal && a.is_nan() && b.is_nan();
    }
    if options.float_epsilon > 0.0 {
        return (a - b).abs() <= options.float_epsilon;
    }
    // IEEE equality: -0.0 == +0.0
    a == b
}

/// `f64` equality: NaN handling first, then epsilon, then IEEE equality.
pub fn f64_equal(a: f64, b: f64, options: &ComparisonOptions) -> bool {
    if a.is_nan() || b.is_nan() {
        return options.treat_nan_equal && a.is_nan() && b.is_nan();
    }
    if options.double_epsilon > 0.0 {
        return (a - b).abs() <= options.double_epsilon;
    }
    a == b
}

/// Decimal equality with an optional tolerance.
pub fn decimal_equal(a: Decimal, b: Decimal, options: &ComparisonOptions) -> bool {
    if options.decimal_epsilon > Decimal::ZERO {
        // Operands at opposite range extremes cannot be within any
        // tolerance; treat subtraction overflow as unequal.
        return match a.checked_sub(b) {
            Some(diff) => diff.abs() <= options.decimal_epsilon,
            None => false,
        };
    }
    a == b
}
