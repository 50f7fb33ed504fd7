//! Dictionary equality.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::types::context::ComparisonContext;
use crate::types::value::{Value, ValueMap};

/// Equality of two maps under a supplied value comparator.
///
/// Counts are compared first; then every left entry must have a
/// matching right entry under the comparator.
pub fn maps_equal<K, V, S>(
    left: &HashMap<K, V, S>,
    right: &HashMap<K, V, S>,
    mut value_eq: impl FnMut(&V, &V) -> bool,
) -> bool
where
    K: Eq + Hash,
    S: BuildHasher,
{
    if left.len() != right.len() {
        return false;
    }
    left.iter().all(|(key, value)| {
        right
            .get(key)
            .map(|other| value_eq(value, other))
            .unwrap_or(false)
    })
}

/// Equality of two shared (read-only) maps.
pub fn shared_maps_equal<K, V, S>(
    left: &Arc<HashMap<K, V, S>>,
    right: &Arc<HashMap<K, V, S>>,
    value_eq: impl FnMut(&V, &V) -> bool,
) -> bool
where
    K: Eq + Hash,
    S: BuildHasher,
{
    if Arc::ptr_eq(left, right) {
        return true;
    }
    maps_equal(left, right, value_eq)
}

/// Equality of two open string-keyed bags under the context's options.
pub fn expando_equal<S: BuildHasher>(
    left: &HashMap<String, Value, S>,
    right: &HashMap<String, Value, S>,
    ctx: &mut ComparisonContext,
) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter().all(|(key, value)| {
        right
            .get(key)
            .map(|other| value.equals_with(other, ctx))
            .unwrap_or(false)
    })
}

/// Equality of two untyped map payloads under the context's options.
///
/// Entry lookup scans by structural key equality; entry order is
/// irrelevant.
pub fn value_maps_equal(left: &ValueMap, right: &ValueMap, ctx: &mut ComparisonContext) -> bool {
    if left.entries.len() != right.entries.len() {
        return false;
    }
    left.entries.iter().all(|(key, value)| {
        right
            .entries
            .iter()
            .find(|(other_key, _)| other_key.equals_with(key, ctx))
            .map(|(_, other)| value.equals_with(other, ctx))
            .unwrap_or(false)
    })
}
