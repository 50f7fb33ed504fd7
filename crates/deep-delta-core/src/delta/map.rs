//! Map delta computation: typed, shared and untyped variants.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::delta::element::DeltaElement;
use crate::document::DeltaWriter;
use crate::types::context::ComparisonContext;
use crate::types::value::{DeltaValue, Value, ValueMap};

/// Compute map ops transforming `left` into `right`.
///
/// Keys present only on the left are removed; keys present only on the
/// right are set. A matched key whose values differ recurses into the
/// value when `nested_values` is requested and the element supports it,
/// falling back to a whole-value set otherwise.
pub fn compute_map_delta<K, V, S>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: &HashMap<K, V, S>,
    right: &HashMap<K, V, S>,
    ctx: &mut ComparisonContext,
    nested_values: bool,
) where
    K: DeltaValue + Eq + Hash,
    V: DeltaElement,
    S: BuildHasher,
{
    for key in left.keys() {
        if !right.contains_key(key) {
            writer.write_dict_remove(member_index, key.to_value());
        }
    }

    for (key, right_value) in right.iter() {
        match left.get(key) {
            None => {
                writer.write_dict_set(member_index, key.to_value(), right_value.to_payload());
            }
            Some(left_value) => {
                if left_value.element_eq(right_value, ctx) {
                    continue;
                }
                if nested_values {
                    let mut scope = writer.begin_dict_nested(member_index, key.to_value());
                    let handled = left_value.compute_nested(right_value, ctx, &mut scope);
                    let wrote = !scope.is_empty();
                    drop(scope);
                    if handled && wrote {
                        continue;
                    }
                }
                writer.write_dict_set(member_index, key.to_value(), right_value.to_payload());
            }
        }
    }
}

/// Map delta over shared (read-only) maps.
///
/// The same Arc on both sides short-circuits to an empty delta.
pub fn compute_shared_map_delta<K, V, S>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: &Arc<HashMap<K, V, S>>,
    right: &Arc<HashMap<K, V, S>>,
    ctx: &mut ComparisonContext,
    nested_values: bool,
) where
    K: DeltaValue + Eq + Hash,
    V: DeltaElement,
    S: BuildHasher,
{
    if Arc::ptr_eq(left, right) {
        return;
    }
    compute_map_delta(writer, member_index, left, right, ctx, nested_values);
}

/// Map delta over open string-keyed bags, with nested values enabled.
pub fn compute_expando_delta<S: BuildHasher>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: &HashMap<String, Value, S>,
    right: &HashMap<String, Value, S>,
    ctx: &mut ComparisonContext,
) {
    compute_map_delta(writer, member_index, left, right, ctx, true);
}

fn lookup<'a>(
    entries: &'a [(Value, Value)],
    key: &Value,
    ctx: &mut ComparisonContext,
) -> Option<&'a Value> {
    for (candidate, value) in entries {
        if candidate.equals_with(key, ctx) {
            return Some(value);
        }
    }
    None
}

/// Map delta over untyped map payloads.
///
/// Entry order is irrelevant; keys match structurally. Matched values
/// recurse when both sides are maps or same-type registered objects.
pub fn compute_value_map_delta(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: &ValueMap,
    right: &ValueMap,
    ctx: &mut ComparisonContext,
    nested_values: bool,
) {
    for (key, _) in &left.entries {
        if lookup(&right.entries, key, ctx).is_none() {
            writer.write_dict_remove(member_index, key.clone());
        }
    }

    for (key, right_value) in &right.entries {
        match lookup(&left.entries, key, ctx) {
            None => {
                writer.write_dict_set(member_index, key.clone(), right_value.clone());
            }
            Some(left_value) => {
                if left_value.equals_with(right_value, ctx) {
                    continue;
                }
                if nested_values {
                    let mut scope = writer.begin_dict_nested(member_index, key.clone());
                    let handled = left_value.compute_nested(right_value, ctx, &mut scope);
                    let wrote = !scope.is_empty();
                    drop(scope);
                    if handled && wrote {
                        continue;
                    }
                }
                writer.write_dict_set(member_index, key.clone(), right_value.clone());
            }
        }
    }
}
