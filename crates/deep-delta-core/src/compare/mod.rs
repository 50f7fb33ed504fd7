/// Comparison primitives for the delta engine
///
/// Value-like equality for scalars, sequences and maps, plus deep
/// polymorphic equality over registered user objects.
/// Deep polymorphic equality
pub mod deep;
/// Dictionary equality
pub mod map;
/// Scalar equality (strings, floats, decimals)
pub mod scalar;
/// Sequence equality (ordered and unordered)
pub mod sequence;

pub use deep::{are_deep_equal, are_deep_equal_dyn};
