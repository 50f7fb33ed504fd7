//! Comparison options controlling equality semantics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// String comparison modes.
///
/// `Ordinal` compares code units. The `*IgnoreCase` modes apply Unicode
/// simple case folding. The invariant and current-culture modes collate
/// like their ordinal counterparts; culture tables are a host concern,
/// but the distinction is preserved in options and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringComparison {
    /// Code-unit comparison
    Ordinal,
    /// Code-unit comparison after case folding
    OrdinalIgnoreCase,
    /// Invariant-culture comparison
    Invariant,
    /// Invariant-culture comparison after case folding
    InvariantIgnoreCase,
    /// Current-culture comparison
    Current,
    /// Current-culture comparison after case folding
    CurrentIgnoreCase,
}

impl StringComparison {
    /// Whether this mode folds case before comparing.
    #[inline]
    pub fn ignores_case(self) -> bool {
        matches!(
            self,
            StringComparison::OrdinalIgnoreCase
                | StringComparison::InvariantIgnoreCase
                | StringComparison::CurrentIgnoreCase
        )
    }
}

impl Default for StringComparison {
    fn default() -> Self {
        StringComparison::Ordinal
    }
}

/// Options configuring deep-equality and delta-computation semantics.
///
/// A zero epsilon requests exact equality for the corresponding numeric
/// family; a positive epsilon accepts `|a - b| <= epsilon`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOptions {
    /// String comparison mode
    pub string_comparison: StringComparison,
    /// Treat two NaN floats as equal
    pub treat_nan_equal: bool,
    /// Tolerance for `f32` comparison; `0` means bit-exact IEEE equality
    pub float_epsilon: f32,
    /// Tolerance for `f64` comparison; `0` means bit-exact IEEE equality
    pub double_epsilon: f64,
    /// Tolerance for decimal comparison; `0` means exact
    pub decimal_epsilon: Decimal,
    /// Ask emitters to validate member dirty-bits before writing.
    /// Consumed by the descriptor/generator layer, carried here so a
    /// single options value configures a whole compute call.
    pub validate_dirty_on_emit: bool,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            string_comparison: StringComparison::default(),
            treat_nan_equal: true,
            float_epsilon: 0.0,
            double_epsilon: 0.0,
            decimal_epsilon: Decimal::ZERO,
            validate_dirty_on_emit: false,
        }
    }
}

impl ComparisonOptions {
    /// Options with case-insensitive string comparison.
    pub fn ignore_case() -> Self {
        Self {
            string_comparison: StringComparison::OrdinalIgnoreCase,
            ..Self::default()
        }
    }

    /// Options with the given float/double tolerances.
    pub fn with_epsilons(float_epsilon: f32, double_epsilon: f64) -> Self {
        Self {
            float_epsilon,
            double_epsilon,
            ..Self::default()
        }
    }
}
