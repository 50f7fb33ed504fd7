//! Ordered sequence delta computation.
//!
//! Alignment strategy: trivial cases first, then a single-insert fast
//! path, then prefix/suffix trimming with duplicate-aware alignment of
//! the remaining window. Removes are emitted in descending index order,
//! adds and replaces in ascending order.

use crate::delta::element::DeltaElement;
use crate::document::DeltaWriter;
use crate::types::context::ComparisonContext;

/// Compute sequence ops transforming `left` into `right`.
///
/// Identical sequences (including the same allocation) emit nothing.
/// Null-vs-sequence transitions are the caller's concern; both sides
/// here are present.
pub fn compute_list_delta<T: DeltaElement>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: &[T],
    right: &[T],
    ctx: &mut ComparisonContext,
) {
    let na = left.len();
    let nb = right.len();

    if na == nb && left.as_ptr() == right.as_ptr() {
        return;
    }
    if na == 0 && nb == 0 {
        return;
    }
    if na == 0 {
        for (i, item) in right.iter().enumerate() {
            writer.write_seq_add_at(member_index, i as i32, item.to_payload());
        }
        return;
    }
    if nb == 0 {
        for i in (0..na).rev() {
            writer.write_seq_remove_at(member_index, i as i32, left[i].to_payload());
        }
        return;
    }

    let mut prefix = 0;
    while prefix < na && prefix < nb && left[prefix].element_eq(&right[prefix], ctx) {
        prefix += 1;
    }
    if prefix == na && prefix == nb {
        return;
    }

    let mut suffix = 0;
    while suffix < na - prefix
        && suffix < nb - prefix
        && left[na - 1 - suffix].element_eq(&right[nb - 1 - suffix], ctx)
    {
        suffix += 1;
    }

    // Single insertion: the prefix and suffix cover all of the left
    // side, so one add at the post-equal split reproduces the right
    // side. The insert index always sits after the run of equal
    // elements.
    if nb == na + 1 && prefix + suffix >= na {
        writer.write_seq_add_at(member_index, prefix as i32, right[prefix].to_payload());
        return;
    }

    let ra = na - prefix - suffix;
    let rb = nb - prefix - suffix;

    if rb > ra {
        let add_budget = rb - ra;
        // Duplicate-aware alignment: slide the left window across the
        // right window, widest shift first. A match means the middle is
        // pure insertion; no replaces are needed.
        for k in (0..=add_budget).rev() {
            if window_matches(left, right, prefix, ra, k, ctx) {
                for i in 0..k {
                    let idx = prefix + i;
                    writer.write_seq_add_at(member_index, idx as i32, right[idx].to_payload());
                }
                for i in 0..(add_budget - k) {
                    let idx = prefix + k + ra + i;
                    writer.write_seq_add_at(member_index, idx as i32, right[idx].to_payload());
                }
                return;
            }
        }
        emit_edits(writer, member_index, left, right, prefix, ra, ctx);
        for i in ra..rb {
            let idx = prefix + i;
            writer.write_seq_add_at(member_index, idx as i32, right[idx].to_payload());
        }
    } else if ra > rb {
        emit_edits(writer, member_index, left, right, prefix, rb, ctx);
        for i in (rb..ra).rev() {
            let idx = prefix + i;
            writer.write_seq_remove_at(member_index, idx as i32, left[idx].to_payload());
        }
    } else {
        emit_edits(writer, member_index, left, right, prefix, ra, ctx);
    }
}

/// Whether `left[prefix .. prefix+len]` matches `right` shifted by `k`.
fn window_matches<T: DeltaElement>(
    left: &[T],
    right: &[T],
    prefix: usize,
    len: usize,
    k: usize,
    ctx: &mut ComparisonContext,
) -> bool {
    (0..len).all(|i| left[prefix + i].element_eq(&right[prefix + k + i], ctx))
}

/// Element-wise edits over the aligned common region.
///
/// Equal pairs are skipped. Differing pairs recurse through a nested
/// scope when the element supports it; an unsupported or empty nested
/// delta degrades to a whole-element replace.
fn emit_edits<T: DeltaElement>(
    writer: &mut DeltaWriter,
    member_index: i32,
    left: &[T],
    right: &[T],
    start: usize,
    count: usize,
    ctx: &mut ComparisonContext,
) {
    for i in 0..count {
        let idx = start + i;
        let (l, r) = (&left[idx], &right[idx]);
        if l.element_eq(r, ctx) {
            continue;
        }
        let mut scope = writer.begin_seq_nested_at(member_index, idx as i32);
        let handled = l.compute_nested(r, ctx, &mut scope);
        let wrote = !scope.is_empty();
        drop(scope);
        if !handled || !wrote {
            writer.write_seq_replace_at(member_index, idx as i32, r.to_payload());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::delta::{DeltaDocument, DeltaKind};

    fn diff(left: &[i32], right: &[i32]) -> DeltaDocument {
        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        compute_list_delta(&mut writer, 0, left, right, &mut ctx);
        writer.finish()
    }

    #[test]
    fn identical_lists_emit_nothing() {
        // Goal: equal content produces an empty document
        assert!(diff(&[1, 2, 3], &[1, 2, 3]).is_empty());
        assert!(diff(&[], &[]).is_empty());
    }

    #[test]
    fn empty_to_full_emits_one_add_per_element() {
        // Goal: first fill is ascending adds
        let doc = diff(&[], &[7, 8]);
        let ops = doc.as_ops();
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|op| op.kind == DeltaKind::SeqAddAt));
        assert_eq!((ops[0].index, ops[1].index), (0, 1));
    }

    #[test]
    fn full_to_empty_emits_descending_removes() {
        // Goal: removes walk from the tail and carry expected elements
        let doc = diff(&[7, 8, 9], &[]);
        let ops = doc.as_ops();
        assert_eq!(ops.len(), 3);
        assert!(ops.iter().all(|op| op.kind == DeltaKind::SeqRemoveAt));
        assert_eq!(ops[0].index, 2);
        assert_eq!(ops[2].index, 0);
        assert_eq!(ops[0].value, Some(crate::types::value::Value::I32(9)));
    }

    #[test]
    fn single_insert_emits_exactly_one_add() {
        // Goal: one insertion anywhere is one SeqAddAt
        let head = diff(&[1, 2], &[7, 1, 2]);
        assert_eq!(head.len(), 1);
        assert_eq!(head.as_ops()[0].kind, DeltaKind::SeqAddAt);
        assert_eq!(head.as_ops()[0].index, 0);

        let middle = diff(&[1, 2], &[1, 7, 2]);
        assert_eq!(middle.len(), 1);
        assert_eq!(middle.as_ops()[0].index, 1);

        let tail = diff(&[1, 2], &[1, 2, 7]);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail.as_ops()[0].index, 2);
    }

    #[test]
    fn insert_among_duplicates_prefers_post_equal_slot() {
        // Goal: [X,X,X] -> [X,X,X,X] inserts at 3
        let doc = diff(&[5, 5, 5], &[5, 5, 5, 5]);
        assert_eq!(doc.len(), 1);
        let op = &doc.as_ops()[0];
        assert_eq!(op.kind, DeltaKind::SeqAddAt);
        assert_eq!(op.index, 3);
    }

    #[test]
    fn middle_replace_emits_single_replace() {
        // Goal: one differing middle element is one SeqReplaceAt
        let doc = diff(&[3, 1, 2], &[3, 9, 2]);
        assert_eq!(doc.len(), 1);
        let op = &doc.as_ops()[0];
        assert_eq!(op.kind, DeltaKind::SeqReplaceAt);
        assert_eq!(op.index, 1);
    }

    #[test]
    fn pre_insertion_before_duplicates_avoids_replaces() {
        // Goal: inserting ahead of a repeated block emits only adds
        let doc = diff(&[1, 4, 4, 9], &[1, 7, 8, 4, 4, 9]);
        assert!(doc.iter().all(|op| op.kind == DeltaKind::SeqAddAt));
        assert_eq!(doc.len(), 2);
        assert_eq!((doc.as_ops()[0].index, doc.as_ops()[1].index), (1, 2));
    }

    #[test]
    fn shrink_emits_descending_removes_with_expected() {
        // Goal: removes come tail-first so earlier indices stay valid
        let doc = diff(&[1, 2, 3, 4], &[1, 4]);
        let removes: Vec<_> = doc
            .iter()
            .filter(|op| op.kind == DeltaKind::SeqRemoveAt)
            .collect();
        assert!(!removes.is_empty());
        let indices: Vec<i32> = removes.iter().map(|op| op.index).collect();
        let mut sorted = indices.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(indices, sorted);
        assert!(removes.iter().all(|op| op.value.is_some()));
    }

    #[test]
    fn mixed_change_keeps_op_ordering_contract() {
        // Goal: replaces ascend; adds ascend; removes descend
        let doc = diff(&[1, 2, 3, 4, 5], &[1, 9, 8, 4, 5, 6]);
        let mut last_add = -1;
        let mut last_replace = -1;
        for op in doc.iter() {
            match op.kind {
                DeltaKind::SeqAddAt => {
                    assert!(op.index > last_add);
                    last_add = op.index;
                }
                DeltaKind::SeqReplaceAt => {
                    assert!(op.index > last_replace);
                    last_replace = op.index;
                }
                _ => {}
            }
        }
    }
}
