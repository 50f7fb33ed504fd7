//! Map apply: typed, shared, expando and untyped-payload targets.
//!
//! `DictNested` only ever mutates entries that already exist; a nested
//! op addressing a missing key is a no-op rather than an insert.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::delta::element::DeltaElement;
use crate::document::DeltaReader;
use crate::types::context::ComparisonContext;
use crate::types::delta::{DeltaKind, DeltaOp};
use crate::types::error::Result;
use crate::types::value::{DeltaValue, Value, ValueMap};

/// Apply map ops to a mutable map.
///
/// Non-map kinds are ignored. Keys or payloads that do not convert to
/// the target's types are skipped without touching the map.
pub fn apply_map_delta<'d, K, V, S>(
    map: &mut HashMap<K, V, S>,
    ops: impl IntoIterator<Item = &'d DeltaOp>,
    _ctx: &mut ComparisonContext,
) -> Result<()>
where
    K: DeltaValue + Eq + Hash,
    V: DeltaElement,
    S: BuildHasher,
{
    for op in ops {
        match op.kind {
            DeltaKind::DictSet => {
                let Some(key) = op.key.as_ref().and_then(K::from_value) else {
                    continue;
                };
                let Some(value) = op.value.as_ref().and_then(V::from_payload) else {
                    continue;
                };
                map.insert(key, value);
            }
            DeltaKind::DictRemove => {
                if let Some(key) = op.key.as_ref().and_then(K::from_value) {
                    map.remove(&key);
                }
            }
            DeltaKind::DictNested => {
                let Some(key) = op.key.as_ref().and_then(K::from_value) else {
                    continue;
                };
                let Some(nested) = op.nested.as_ref() else {
                    continue;
                };
                // missing keys are not materialized
                if let Some(slot) = map.get_mut(&key) {
                    let mut reader = DeltaReader::new(nested);
                    slot.apply_nested(&mut reader);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Apply map ops to a shared (read-only) map.
///
/// The map is cloned, edited and swapped in; the original allocation
/// is never mutated. An empty op set leaves the reference untouched.
pub fn apply_shared_map_delta<'d, K, V, S>(
    target: &mut Arc<HashMap<K, V, S>>,
    ops: impl IntoIterator<Item = &'d DeltaOp>,
    ctx: &mut ComparisonContext,
) -> Result<()>
where
    K: DeltaValue + Eq + Hash + Clone,
    V: DeltaElement,
    S: BuildHasher + Clone,
{
    let ops: Vec<&DeltaOp> = ops.into_iter().filter(|op| op.kind.is_map()).collect();
    if ops.is_empty() {
        return Ok(());
    }
    let mut edited: HashMap<K, V, S> = (**target).clone();
    apply_map_delta(&mut edited, ops, ctx)?;
    *target = Arc::new(edited);
    Ok(())
}

/// Apply map ops to an open string-keyed bag.
///
/// The bag itself keeps its identity; nested ops mutate values in
/// place through the object or map dispatch of [`Value`].
pub fn apply_expando_delta<'d, S: BuildHasher>(
    map: &mut HashMap<String, Value, S>,
    ops: impl IntoIterator<Item = &'d DeltaOp>,
    ctx: &mut ComparisonContext,
) -> Result<()> {
    apply_map_delta(map, ops, ctx)
}

/// Apply map ops to an untyped map payload.
///
/// Keys match by document equality. `DictNested` recurses through the
/// value's own dispatch and never creates entries.
pub fn apply_value_map_delta(map: &mut ValueMap, ops: &[DeltaOp]) {
    for op in ops {
        match op.kind {
            DeltaKind::DictSet => {
                let (Some(key), Some(value)) = (op.key.as_ref(), op.value.as_ref()) else {
                    continue;
                };
                match map.entries.iter_mut().find(|(k, _)| k == key) {
                    Some(slot) => slot.1 = value.clone(),
                    None => map.entries.push((key.clone(), value.clone())),
                }
            }
            DeltaKind::DictRemove => {
                if let Some(key) = op.key.as_ref() {
                    map.entries.retain(|(k, _)| k != key);
                }
            }
            DeltaKind::DictNested => {
                let (Some(key), Some(nested)) = (op.key.as_ref(), op.nested.as_ref()) else {
                    continue;
                };
                if let Some((_, slot)) = map.entries.iter_mut().find(|(k, _)| k == key) {
                    let mut reader = DeltaReader::new(nested);
                    slot.apply_nested(&mut reader);
                }
            }
            _ => {}
        }
    }
}
