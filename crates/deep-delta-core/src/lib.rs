//! # Deep Delta Core
//!
//! Structural delta engine: deep equality under configurable semantics,
//! delta computation over user types and containers, in-place delta
//! application with replay safety, and a binary wire codec.
//! This crate is the transport-free core; schema declaration and
//! per-type helper generation live in outer layers that feed the
//! helper registry.

#![warn(missing_docs)]

/// Delta application engine
pub mod apply;
/// Binary wire codec
pub mod codec;
/// Comparison primitives
pub mod compare;
/// System constants
pub mod constants;
/// Core application components
pub mod core;
/// Delta computation
pub mod delta;
/// Delta document IO
pub mod document;
/// Process-wide helper registry
pub mod registry;
/// Type definitions for all data structures
pub mod types;

// Re-export commonly used items
pub use apply::{apply_delta, take_replace_object};
pub use codec::{decode, encode, CodecOptions};
pub use compare::{are_deep_equal, are_deep_equal_dyn};
pub use self::core::{load_config, load_config_or_default, EngineConfig};
pub use delta::{compute_delta, DeltaElement};
pub use document::{DeltaReader, DeltaWriter};
pub use registry::{
    compute_delta_same_type, register_comparer, register_delta, register_diff, register_enum_type,
    register_fallback, try_apply_delta_same_type, try_compare_same_type, try_get_diff, warm_up,
    Diff, DiffEntry, RegisterHelpers,
};
pub use types::{
    ComparisonContext, ComparisonOptions, DeltaDocument, DeltaKind, DeltaOp, DeltaValue, Error,
    Result, StringComparison, Value,
};
