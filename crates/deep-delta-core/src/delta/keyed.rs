//! Keyed sequence delta computation.
//!
//! Elements are matched by key rather than position, so reorders emit
//! nothing and edits address the element's original left-side index.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use ahash::RandomState;

use crate::delta::element::DeltaElement;
use crate::document::DeltaWriter;
use crate::types::context::ComparisonContext;

/// Compute keyed sequence ops transforming `left` into `right`.
///
/// Removals are emitted in left order and carry the removed element.
/// Additions use the element's right-side index. Matched keys whose
/// elements differ recurse at the left-side index, degrading to a
/// whole-element replace when the nested delta is empty or the element
/// does not support recursion.
pub fn compute_keyed_list_delta<T, K, F>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: &[T],
    right: &[T],
    ctx: &mut ComparisonContext,
    key_of: F,
) where
    T: DeltaElement,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let left_index: HashMap<K, usize, RandomState> = left
        .iter()
        .enumerate()
        .map(|(i, item)| (key_of(item), i))
        .collect();
    let right_keys: HashSet<K, RandomState> = right.iter().map(&key_of).collect();

    for (i, item) in left.iter().enumerate() {
        if !right_keys.contains(&key_of(item)) {
            writer.write_seq_remove_at(member_index, i as i32, item.to_payload());
        }
    }

    for (right_idx, item) in right.iter().enumerate() {
        match left_index.get(&key_of(item)) {
            None => {
                writer.write_seq_add_at(member_index, right_idx as i32, item.to_payload());
            }
            Some(&left_idx) => {
                let existing = &left[left_idx];
                if existing.element_eq(item, ctx) {
                    continue;
                }
                let mut scope = writer.begin_seq_nested_at(member_index, left_idx as i32);
                let handled = existing.compute_nested(item, ctx, &mut scope);
                let wrote = !scope.is_empty();
                drop(scope);
                if !handled || !wrote {
                    writer.write_seq_replace_at(member_index, left_idx as i32, item.to_payload());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::delta::{DeltaDocument, DeltaKind};
    use crate::types::value::Value;

    fn diff(left: &[(i32, String)], right: &[(i32, String)]) -> DeltaDocument {
        #[derive(Debug, Clone, PartialEq)]
        struct Row {
            id: i32,
            name: String,
        }
        impl DeltaElement for Row {
            fn element_eq(&self, other: &Self, _ctx: &mut ComparisonContext) -> bool {
                self == other
            }
            fn to_payload(&self) -> Value {
                Value::from(self.name.as_str())
            }
            fn from_payload(_value: &Value) -> Option<Self> {
                None
            }
        }

        let to_rows = |pairs: &[(i32, String)]| -> Vec<Row> {
            pairs
                .iter()
                .map(|(id, name)| Row {
                    id: *id,
                    name: name.clone(),
                })
                .collect()
        };
        let left = to_rows(left);
        let right = to_rows(right);
        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        compute_keyed_list_delta(&mut writer, 0, &left, &right, &mut ctx, |row| row.id);
        writer.finish()
    }

    fn rows(pairs: &[(i32, &str)]) -> Vec<(i32, String)> {
        pairs.iter().map(|(id, name)| (*id, name.to_string())).collect()
    }

    #[test]
    fn reorder_only_emits_nothing() {
        // Goal: key-matched equal elements in any order are a no-op
        let left = rows(&[(1, "a"), (2, "b"), (3, "c")]);
        let right = rows(&[(3, "c"), (1, "a"), (2, "b")]);
        assert!(diff(&left, &right).is_empty());
    }

    #[test]
    fn removed_keys_emit_removes_in_left_order() {
        // Goal: removals carry the left value and left index
        let left = rows(&[(1, "a"), (2, "b"), (3, "c")]);
        let right = rows(&[(2, "b")]);
        let doc = diff(&left, &right);
        let ops = doc.as_ops();
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|op| op.kind == DeltaKind::SeqRemoveAt));
        assert_eq!((ops[0].index, ops[1].index), (0, 2));
        assert_eq!(ops[0].value, Some(Value::from("a")));
    }

    #[test]
    fn new_keys_emit_adds_at_right_index() {
        // Goal: additions use the right-side position
        let left = rows(&[(1, "a")]);
        let right = rows(&[(9, "x"), (1, "a")]);
        let doc = diff(&left, &right);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.as_ops()[0].kind, DeltaKind::SeqAddAt);
        assert_eq!(doc.as_ops()[0].index, 0);
    }

    #[test]
    fn changed_value_without_nested_support_replaces_at_left_index() {
        // Goal: nested fallback lands on the left-side index
        let left = rows(&[(1, "a"), (2, "b")]);
        let right = rows(&[(2, "B"), (1, "a")]);
        let doc = diff(&left, &right);
        assert_eq!(doc.len(), 1);
        let op = &doc.as_ops()[0];
        assert_eq!(op.kind, DeltaKind::SeqReplaceAt);
        assert_eq!(op.index, 1);
        assert_eq!(op.value, Some(Value::from("B")));
    }
}
