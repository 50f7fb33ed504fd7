//! Delta computation: member helpers and the container algorithms.
//!
//! The descriptor layer drives these helpers member by member. Each
//! helper owns the null-transition rules for its member shape and
//! delegates to the container algorithms once both sides are present.

/// Element behavior for container algorithms
pub mod element;
/// Keyed sequence algorithm
pub mod keyed;
/// Ordered sequence algorithm
pub mod list;
/// Map algorithms
pub mod map;

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::compare::sequence;
use crate::document::DeltaWriter;
use crate::registry;
use crate::types::context::ComparisonContext;
use crate::types::value::{DeltaValue, Value, ValueList, ValueMap};

pub use element::DeltaElement;
pub use keyed::compute_keyed_list_delta;
pub use list::compute_list_delta;
pub use map::{
    compute_expando_delta, compute_map_delta, compute_shared_map_delta, compute_value_map_delta,
};

/// Compute a delta between two values of a registered type, writing
/// into `writer`. Returns `false` when no helper is registered; the
/// caller degrades to a shallow member replacement.
pub fn compute_delta<T: std::any::Any>(
    left: &T,
    right: &T,
    ctx: &mut ComparisonContext,
    writer: &mut DeltaWriter,
) -> bool {
    registry::compute_delta_same_type(left, right, ctx, writer)
}

/// List payload for a whole-sequence replacement.
pub fn list_payload<T: DeltaElement>(items: &[T]) -> Value {
    Value::List(ValueList {
        elem: T::element_spec(),
        items: items.iter().map(DeltaElement::to_payload).collect(),
    })
}

/// Map payload for a whole-map replacement.
pub fn map_payload<K, V, S>(map: &HashMap<K, V, S>) -> Value
where
    K: DeltaValue + Eq + Hash,
    V: DeltaElement,
    S: BuildHasher,
{
    Value::Map(ValueMap {
        key: K::type_spec(),
        value: V::element_spec(),
        entries: map
            .iter()
            .map(|(k, v)| (k.to_value(), v.to_payload()))
            .collect(),
    })
}

/// Emit ops for a scalar or object member.
///
/// Equal members emit nothing. Differing members recurse through a
/// nested scope when the element supports it; otherwise (or when the
/// nested delta comes back empty) a shallow `SetMember` is emitted.
pub fn compute_member<T: DeltaElement>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: &T,
    right: &T,
    ctx: &mut ComparisonContext,
) {
    if left.element_eq(right, ctx) {
        return;
    }
    let mut scope = writer.begin_nested_member(member_index);
    let handled = left.compute_nested(right, ctx, &mut scope);
    let wrote = !scope.is_empty();
    drop(scope);
    if !handled || !wrote {
        writer.write_set_member(member_index, right.to_payload());
    }
}

/// Emit ops for an ordered list member, handling null transitions.
///
/// A side that is absent turns the whole change into a `SetMember`
/// carrying the new list (or `Null`).
pub fn compute_list_member<T: DeltaElement>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: Option<&[T]>,
    right: Option<&[T]>,
    ctx: &mut ComparisonContext,
) {
    match (left, right) {
        (Some(left), Some(right)) => {
            compute_list_delta(writer, member_index, left, right, ctx);
        }
        (None, Some(right)) => {
            writer.write_set_member(member_index, list_payload(right));
        }
        (Some(_), None) => {
            writer.write_set_member(member_index, Value::Null);
        }
        (None, None) => {}
    }
}

/// Emit ops for a keyed list member, handling null transitions.
pub fn compute_keyed_list_member<T, K, F>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: Option<&[T]>,
    right: Option<&[T]>,
    ctx: &mut ComparisonContext,
    key_of: F,
) where
    T: DeltaElement,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    match (left, right) {
        (Some(left), Some(right)) => {
            compute_keyed_list_delta(writer, member_index, left, right, ctx, key_of);
        }
        (None, Some(right)) => {
            writer.write_set_member(member_index, list_payload(right));
        }
        (Some(_), None) => {
            writer.write_set_member(member_index, Value::Null);
        }
        (None, None) => {}
    }
}

/// Emit ops for a shared (read-only) list member.
///
/// Shared sequences are not edited in place, so any content difference
/// degrades to a shallow `SetMember` carrying the new list.
pub fn compute_shared_list_member<T: DeltaElement>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: Option<&Arc<Vec<T>>>,
    right: Option<&Arc<Vec<T>>>,
    ctx: &mut ComparisonContext,
) {
    match (left, right) {
        (Some(left), Some(right)) => {
            if Arc::ptr_eq(left, right) {
                return;
            }
            if sequence::ordered_equal(left, right, |a, b| a.element_eq(b, ctx)) {
                return;
            }
            writer.write_set_member(member_index, list_payload(right));
        }
        (None, Some(right)) => {
            writer.write_set_member(member_index, list_payload(right));
        }
        (Some(_), None) => {
            writer.write_set_member(member_index, Value::Null);
        }
        (None, None) => {}
    }
}

/// Emit ops for a map member, handling null transitions.
pub fn compute_map_member<K, V, S>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: Option<&HashMap<K, V, S>>,
    right: Option<&HashMap<K, V, S>>,
    ctx: &mut ComparisonContext,
    nested_values: bool,
) where
    K: DeltaValue + Eq + Hash,
    V: DeltaElement,
    S: BuildHasher,
{
    match (left, right) {
        (Some(left), Some(right)) => {
            compute_map_delta(writer, member_index, left, right, ctx, nested_values);
        }
        (None, Some(right)) => {
            writer.write_set_member(member_index, map_payload(right));
        }
        (Some(_), None) => {
            writer.write_set_member(member_index, Value::Null);
        }
        (None, None) => {}
    }
}

/// Emit ops for an open string-keyed bag member, handling null
/// transitions. Nested values are always enabled for bags.
pub fn compute_expando_member<S: BuildHasher>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: Option<&HashMap<String, Value, S>>,
    right: Option<&HashMap<String, Value, S>>,
    ctx: &mut ComparisonContext,
) {
    match (left, right) {
        (Some(left), Some(right)) => {
            compute_expando_delta(writer, member_index, left, right, ctx);
        }
        (None, Some(right)) => {
            writer.write_set_member(member_index, map_payload(right));
        }
        (Some(_), None) => {
            writer.write_set_member(member_index, Value::Null);
        }
        (None, None) => {}
    }
}
