//! Sequence apply with idempotence guards.
//!
//! Inserts tolerate partial replay: an add whose element is already in
//! place is skipped, and adds past the end clamp to an append unless
//! the tail already ends with the element. Removes only fire when the
//! slot still holds the expected element.

use std::sync::Arc;

use crate::delta::element::DeltaElement;
use crate::document::DeltaReader;
use crate::types::context::ComparisonContext;
use crate::types::delta::{DeltaKind, DeltaOp};
use crate::types::error::{ContractError, Result};

/// Apply one sequence op to a mutable list.
///
/// Non-sequence kinds are ignored. Payloads that do not convert to the
/// element type are skipped without touching the list.
pub fn apply_list_op<T: DeltaElement>(
    list: &mut Vec<T>,
    op: &DeltaOp,
    ctx: &mut ComparisonContext,
) -> Result<()> {
    match op.kind {
        DeltaKind::SeqReplaceAt => {
            if op.index < 0 {
                return Ok(());
            }
            let idx = op.index as usize;
            if idx >= list.len() {
                return Ok(());
            }
            if let Some(value) = op.value.as_ref().and_then(T::from_payload) {
                list[idx] = value;
            }
        }
        DeltaKind::SeqAddAt => {
            if op.index < 0 {
                return Ok(());
            }
            let Some(value) = op.value.as_ref().and_then(T::from_payload) else {
                return Ok(());
            };
            apply_add(list, op.index as usize, value, ctx);
        }
        DeltaKind::SeqRemoveAt => {
            let Some(expected) = op.value.as_ref() else {
                return Err(ContractError::MissingExpectedElement { index: op.index }.into());
            };
            if op.index < 0 {
                return Ok(());
            }
            let idx = op.index as usize;
            let Some(expected) = T::from_payload(expected) else {
                return Ok(());
            };
            if idx < list.len() && list[idx].element_eq(&expected, ctx) {
                list.remove(idx);
            }
        }
        DeltaKind::SeqNestedAt => {
            if op.index < 0 {
                return Ok(());
            }
            let idx = op.index as usize;
            if idx >= list.len() {
                return Ok(());
            }
            if let Some(nested) = op.nested.as_ref() {
                let mut reader = DeltaReader::new(nested);
                list[idx].apply_nested(&mut reader);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Guarded insert. Replayed adds are no-ops; indices beyond the end
/// clamp to an append unless the tail already carries the element.
fn apply_add<T: DeltaElement>(
    list: &mut Vec<T>,
    idx: usize,
    value: T,
    ctx: &mut ComparisonContext,
) {
    let count = list.len();
    if idx < count {
        if list[idx].element_eq(&value, ctx) {
            return;
        }
        list.insert(idx, value);
    } else {
        if let Some(last) = list.last() {
            if last.element_eq(&value, ctx) {
                return;
            }
        }
        list.push(value);
    }
}

/// Apply a run of sequence ops to a mutable list.
///
/// Runs of strictly-increasing `SeqAddAt` ops take a fast lane: when
/// the whole run either replays an already-present prefix or appends
/// contiguously past the end, the appends land in one pass with
/// capacity reserved up front. Any violation falls back to the
/// per-op path for that run.
pub fn apply_list_delta<'d, T: DeltaElement>(
    list: &mut Vec<T>,
    ops: impl IntoIterator<Item = &'d DeltaOp>,
    ctx: &mut ComparisonContext,
) -> Result<()> {
    let ops: Vec<&DeltaOp> = ops.into_iter().filter(|op| op.kind.is_sequence()).collect();
    let mut i = 0;
    while i < ops.len() {
        if ops[i].kind == DeltaKind::SeqAddAt {
            let mut j = i + 1;
            while j < ops.len()
                && ops[j].kind == DeltaKind::SeqAddAt
                && ops[j].index > ops[j - 1].index
            {
                j += 1;
            }
            if j - i >= 2 && try_fast_add_run(list, &ops[i..j], ctx) {
                i = j;
                continue;
            }
        }
        apply_list_op(list, ops[i], ctx)?;
        i += 1;
    }
    Ok(())
}

/// One-pass application of an increasing `SeqAddAt` run.
///
/// Nothing is mutated until the whole run validates.
fn try_fast_add_run<T: DeltaElement>(
    list: &mut Vec<T>,
    run: &[&DeltaOp],
    ctx: &mut ComparisonContext,
) -> bool {
    let count = list.len();
    let mut appends: Vec<T> = Vec::new();
    let mut virtual_len = count;
    for op in run {
        if op.index < 0 {
            return false;
        }
        let idx = op.index as usize;
        let Some(value) = op.value.as_ref().and_then(T::from_payload) else {
            return false;
        };
        if idx < count {
            // replay against the already-present prefix
            if !list[idx].element_eq(&value, ctx) {
                return false;
            }
        } else if idx == virtual_len {
            appends.push(value);
            virtual_len += 1;
        } else {
            return false;
        }
    }
    list.reserve(appends.len());
    list.extend(appends);
    true
}

/// Apply sequence ops to a shared (read-only) list.
///
/// The list is cloned with a capacity hint, edited, and swapped in;
/// the original allocation is never mutated. An empty op set leaves
/// the target reference untouched.
pub fn apply_shared_list_delta<'d, T: DeltaElement>(
    target: &mut Arc<Vec<T>>,
    ops: impl IntoIterator<Item = &'d DeltaOp>,
    ctx: &mut ComparisonContext,
) -> Result<()> {
    let ops: Vec<&DeltaOp> = ops.into_iter().filter(|op| op.kind.is_sequence()).collect();
    if ops.is_empty() {
        return Ok(());
    }
    let add_hint = ops
        .iter()
        .filter(|op| op.kind == DeltaKind::SeqAddAt)
        .count();
    let mut edited: Vec<T> = Vec::with_capacity(target.len() + add_hint);
    edited.extend(target.iter().cloned());
    apply_list_delta(&mut edited, ops, ctx)?;
    *target = Arc::new(edited);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Value;

    fn ctx() -> ComparisonContext {
        ComparisonContext::with_defaults()
    }

    #[test]
    fn replace_within_range_assigns() {
        // Goal: in-range replace writes the new element
        let mut list = vec![1, 2, 3];
        let op = DeltaOp::seq_replace_at(0, 1, Value::I32(9));
        apply_list_op(&mut list, &op, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 9, 3]);

        // out-of-range replace is a no-op
        let op = DeltaOp::seq_replace_at(0, 10, Value::I32(9));
        apply_list_op(&mut list, &op, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 9, 3]);
    }

    #[test]
    fn add_replay_is_idempotent() {
        // Goal: re-applying an insert leaves the list unchanged
        let mut list = vec![1, 2];
        let op = DeltaOp::seq_add_at(0, 1, Value::I32(7));
        apply_list_op(&mut list, &op, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 7, 2]);
        apply_list_op(&mut list, &op, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 7, 2]);
    }

    #[test]
    fn add_beyond_end_clamps_to_append() {
        // Goal: an index past the end appends unless the tail matches
        let mut list = vec![1];
        let op = DeltaOp::seq_add_at(0, 9, Value::I32(5));
        apply_list_op(&mut list, &op, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 5]);

        // replaying the clamped append is a no-op
        apply_list_op(&mut list, &op, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 5]);
    }

    #[test]
    fn remove_requires_expected_match() {
        // Goal: a stale expected element makes the remove a no-op
        let mut list = vec![1, 2, 3];
        let stale = DeltaOp::seq_remove_at(0, 1, Value::I32(99));
        apply_list_op(&mut list, &stale, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 2, 3]);

        let fresh = DeltaOp::seq_remove_at(0, 1, Value::I32(2));
        apply_list_op(&mut list, &fresh, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 3]);

        // replay after the remove: the slot now holds 3, not 2
        apply_list_op(&mut list, &fresh, &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 3]);
    }

    #[test]
    fn remove_without_expected_is_a_contract_error() {
        // Goal: a SeqRemoveAt op missing its payload aborts
        let mut list = vec![1];
        let mut op = DeltaOp::seq_remove_at(0, 0, Value::I32(1));
        op.value = None;
        let err = apply_list_op(&mut list, &op, &mut ctx()).unwrap_err();
        assert!(err.is_contract_error());
        assert_eq!(list, vec![1]);
    }

    #[test]
    fn fast_lane_appends_contiguous_run() {
        // Goal: an increasing append run lands in one pass
        let mut list = vec![1, 2];
        let ops = vec![
            DeltaOp::seq_add_at(0, 2, Value::I32(3)),
            DeltaOp::seq_add_at(0, 3, Value::I32(4)),
            DeltaOp::seq_add_at(0, 4, Value::I32(5)),
        ];
        apply_list_delta(&mut list, ops.iter(), &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn fast_lane_replays_present_prefix() {
        // Goal: replaying a mixed replay/append run applies only the tail
        let mut list = vec![1, 2, 3];
        let ops = vec![
            DeltaOp::seq_add_at(0, 1, Value::I32(2)),
            DeltaOp::seq_add_at(0, 3, Value::I32(4)),
        ];
        apply_list_delta(&mut list, ops.iter(), &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 2, 3, 4]);
    }

    #[test]
    fn fast_lane_violation_falls_back_to_per_op_path() {
        // Goal: a non-replay insert inside the run still applies correctly
        let mut list = vec![1, 5];
        let ops = vec![
            DeltaOp::seq_add_at(0, 1, Value::I32(3)),
            DeltaOp::seq_add_at(0, 2, Value::I32(4)),
        ];
        apply_list_delta(&mut list, ops.iter(), &mut ctx()).unwrap();
        assert_eq!(list, vec![1, 3, 4, 5]);
    }

    #[test]
    fn shared_list_clones_and_replaces() {
        // Goal: the original allocation is untouched; the Arc is swapped
        let original = Arc::new(vec![1, 2]);
        let mut target = Arc::clone(&original);
        let ops = vec![DeltaOp::seq_add_at(0, 2, Value::I32(3))];
        apply_shared_list_delta(&mut target, ops.iter(), &mut ctx()).unwrap();
        assert_eq!(*target, vec![1, 2, 3]);
        assert_eq!(*original, vec![1, 2]);

        // empty op set leaves the reference alone
        let before = Arc::as_ptr(&target);
        apply_shared_list_delta(&mut target, std::iter::empty::<&DeltaOp>(), &mut ctx()).unwrap();
        assert_eq!(Arc::as_ptr(&target), before);
    }

    #[test]
    fn nested_at_dispatches_into_elements() {
        // Goal: SeqNestedAt recurses into untyped map elements
        use crate::types::value::{KnownTypeCode, TypeSpec, ValueMap};

        let entry = |v: i32| {
            Value::Map(ValueMap {
                key: TypeSpec::Known(KnownTypeCode::String),
                value: TypeSpec::Known(KnownTypeCode::I32),
                entries: vec![(Value::from("n"), Value::I32(v))],
            })
        };
        let mut list = vec![entry(1)];
        let mut nested = crate::types::delta::DeltaDocument::new();
        nested.push(DeltaOp::dict_set(-1, Value::from("n"), Value::I32(2)));
        let op = DeltaOp::seq_nested_at(0, 0, nested);
        apply_list_op(&mut list, &op, &mut ctx()).unwrap();
        assert_eq!(list[0], entry(2));
    }
}
