/// Type definitions for the delta engine
///
/// This module contains all type definitions organized by category.
/// Comparison context and options
pub mod context;
/// Delta operations and documents
pub mod delta;
/// System-wide error types
pub mod error;
/// Comparison options
pub mod options;
/// Tick-based temporal values
pub mod temporal;
/// Tagged payload values
pub mod value;

// Re-export commonly used types for convenience
pub use context::ComparisonContext;
pub use delta::{DeltaDocument, DeltaKind, DeltaOp};
pub use error::{
    CapacityError, ContractError, DecodeError, EncodeError, Error, RegistryError, Result,
};
pub use options::{ComparisonOptions, StringComparison};
pub use temporal::{DateTime, DateTimeKind, DateTimeOffset, TimeSpan};
pub use value::{
    DeltaValue, EnumTypeId, EnumUnderlying, EnumValue, KnownTypeCode, ObjectHandle, ObjectValue,
    TypeSpec, Value, ValueList, ValueMap,
};
