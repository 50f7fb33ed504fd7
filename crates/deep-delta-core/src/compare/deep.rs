//! Deep polymorphic equality over user objects.

use std::any::Any;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::compare::scalar;
use crate::registry;
use crate::types::context::ComparisonContext;

/// Numeric view of a type-erased scalar, promoted to `f64`.
fn as_numeric(value: &dyn Any) -> Option<f64> {
    if let Some(v) = value.downcast_ref::<i8>() {
        return Some(f64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<i16>() {
        return Some(f64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<i32>() {
        return Some(f64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<i64>() {
        return Some(*v as f64);
    }
    if let Some(v) = value.downcast_ref::<u8>() {
        return Some(f64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<u16>() {
        return Some(f64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<u32>() {
        return Some(f64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<u64>() {
        return Some(*v as f64);
    }
    if let Some(v) = value.downcast_ref::<f32>() {
        return Some(f64::from(*v));
    }
    if let Some(v) = value.downcast_ref::<f64>() {
        return Some(*v);
    }
    if let Some(v) = value.downcast_ref::<Decimal>() {
        return v.to_f64();
    }
    None
}

/// Deep equality of two values of a known static type.
///
/// A registered comparer takes precedence; without one the comparison
/// falls back to the type's own equality.
pub fn are_deep_equal<T: Any + PartialEq>(
    left: &T,
    right: &T,
    ctx: &mut ComparisonContext,
) -> bool {
    if std::ptr::eq(left, right) {
        return true;
    }
    match registry::try_compare_same_type(left, right, ctx) {
        Some(result) => result,
        None => left == right,
    }
}

/// Deep equality of two type-erased values.
///
/// Reference identity short-circuits. Values of different runtime types
/// are compared numerically where both promote to `f64`; otherwise they
/// are unequal. Same-type pairs dispatch through the registry with
/// cycle entry around the pair.
pub fn are_deep_equal_dyn(left: &dyn Any, right: &dyn Any, ctx: &mut ComparisonContext) -> bool {
    if std::ptr::eq(left as *const dyn Any as *const (), right as *const dyn Any as *const ()) {
        return true;
    }
    if left.type_id() != right.type_id() {
        return match (as_numeric(left), as_numeric(right)) {
            (Some(a), Some(b)) => scalar::f64_equal(a, b, &ctx.options),
            _ => false,
        };
    }
    if !ctx.enter_refs(left, right) {
        return true;
    }
    let equal = registry::try_compare_same_type(left, right, ctx).unwrap_or(false);
    ctx.exit_refs(left, right);
    equal
}
