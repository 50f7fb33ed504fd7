//! Configuration for the delta engine.
//!
//! This module handles configuration settings for comparison semantics
//! and the wire codec, loadable from TOML.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::codec::CodecOptions;
use crate::constants::{MAX_NESTING, MAX_OPS, MAX_STRING_BYTES};
use crate::types::options::{ComparisonOptions, StringComparison};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Comparison semantics
    pub comparison: ComparisonConfig,

    /// Codec profile and caps
    pub codec: CodecConfig,
}

/// Comparison configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// String comparison mode
    pub string_comparison: StringComparison,

    /// Treat two NaN floats as equal
    pub treat_nan_equal: bool,

    /// Tolerance for f32 comparison
    pub float_epsilon: f32,

    /// Tolerance for f64 comparison
    pub double_epsilon: f64,

    /// Tolerance for decimal comparison
    pub decimal_epsilon: Decimal,

    /// Validate member dirty-bits before emitting
    pub validate_dirty_on_emit: bool,

    /// Track visited pairs to terminate recursion over cyclic graphs
    pub cycle_tracking: bool,
}

/// Codec configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Emit the magic/version/fingerprint/flags header
    pub include_header: bool,

    /// Schema fingerprint written to headerful frames
    pub stable_type_fingerprint: u64,

    /// Intern repeated and long strings
    pub use_string_table: bool,

    /// Collect referenced enum types into a table
    pub use_enum_type_table: bool,

    /// Carry full enum identity with inline descriptors
    pub include_enum_type_identity: bool,

    /// Cap on total operations
    pub max_ops: usize,

    /// Cap on string payload bytes
    pub max_string_bytes: usize,

    /// Cap on nesting depth
    pub max_nesting: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            string_comparison: StringComparison::Ordinal,
            treat_nan_equal: true,
            float_epsilon: 0.0,
            double_epsilon: 0.0,
            decimal_epsilon: Decimal::ZERO,
            validate_dirty_on_emit: false,
            cycle_tracking: true,
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            include_header: true,
            stable_type_fingerprint: 0,
            use_string_table: true,
            use_enum_type_table: true,
            include_enum_type_identity: true,
            max_ops: MAX_OPS,
            max_string_bytes: MAX_STRING_BYTES,
            max_nesting: MAX_NESTING,
        }
    }
}

impl ComparisonConfig {
    /// Materialize comparison options from this section.
    pub fn to_options(&self) -> ComparisonOptions {
        ComparisonOptions {
            string_comparison: self.string_comparison,
            treat_nan_equal: self.treat_nan_equal,
            float_epsilon: self.float_epsilon,
            double_epsilon: self.double_epsilon,
            decimal_epsilon: self.decimal_epsilon,
            validate_dirty_on_emit: self.validate_dirty_on_emit,
        }
    }
}

impl CodecConfig {
    /// Materialize codec options from this section.
    pub fn to_options(&self) -> CodecOptions {
        CodecOptions {
            include_header: self.include_header,
            stable_type_fingerprint: self.stable_type_fingerprint,
            use_string_table: self.use_string_table,
            use_enum_type_table: self.use_enum_type_table,
            include_enum_type_identity: self.include_enum_type_identity,
            max_ops: self.max_ops,
            max_string_bytes: self.max_string_bytes,
            max_nesting: self.max_nesting,
        }
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &str) -> crate::types::error::Result<EngineConfig> {
    let config_str = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&config_str)
        .map_err(|e| crate::types::error::Error::config(e.to_string()))?;
    Ok(config)
}

/// Load configuration from a file or fall back to defaults.
pub fn load_config_or_default(path: Option<&str>) -> EngineConfig {
    match path {
        Some(path) => match load_config(path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from: {}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}. Using defaults.", path, e);
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    }
}
