//! Delta operations and documents.

use crate::constants::{DOCUMENT_MEMBER_INDEX, NO_INDEX};
use crate::types::value::Value;

/// Operation kind, a single byte on the wire.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaKind {
    /// Replace the whole object at the document root
    ReplaceObject = 0,
    /// Shallow-replace a member value
    SetMember = 1,
    /// Recurse into a member with a nested document
    NestedMember = 2,
    /// Replace the sequence element at an index
    SeqReplaceAt = 3,
    /// Insert a sequence element at an index
    SeqAddAt = 4,
    /// Remove the sequence element at an index, guarded by the
    /// expected element
    SeqRemoveAt = 5,
    /// Recurse into the sequence element at an index
    SeqNestedAt = 6,
    /// Upsert a map entry
    DictSet = 7,
    /// Remove a map entry
    DictRemove = 8,
    /// Recurse into the map value at a key
    DictNested = 9,
}

impl DeltaKind {
    /// Convert a wire byte back to a kind.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DeltaKind::ReplaceObject),
            1 => Some(DeltaKind::SetMember),
            2 => Some(DeltaKind::NestedMember),
            3 => Some(DeltaKind::SeqReplaceAt),
            4 => Some(DeltaKind::SeqAddAt),
            5 => Some(DeltaKind::SeqRemoveAt),
            6 => Some(DeltaKind::SeqNestedAt),
            7 => Some(DeltaKind::DictSet),
            8 => Some(DeltaKind::DictRemove),
            9 => Some(DeltaKind::DictNested),
            _ => None,
        }
    }

    /// Whether this kind addresses a sequence slot.
    pub fn is_sequence(self) -> bool {
        matches!(
            self,
            DeltaKind::SeqReplaceAt
                | DeltaKind::SeqAddAt
                | DeltaKind::SeqRemoveAt
                | DeltaKind::SeqNestedAt
        )
    }

    /// Whether this kind addresses a map entry.
    pub fn is_map(self) -> bool {
        matches!(
            self,
            DeltaKind::DictSet | DeltaKind::DictRemove | DeltaKind::DictNested
        )
    }
}

/// A single edit in a delta document.
///
/// Ops are immutable once appended. Which fields are meaningful depends
/// on `kind`; unused fields hold `-1` / `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaOp {
    /// Member on the enclosing object, `-1` for document-level ops
    pub member_index: i32,
    /// Operation kind
    pub kind: DeltaKind,
    /// Sequence position for `Seq*` ops, `-1` otherwise
    pub index: i32,
    /// Map key for `Dict*` ops
    pub key: Option<Value>,
    /// Payload: new element, new member value, or removed expected element
    pub value: Option<Value>,
    /// Sub-document for nested ops
    pub nested: Option<DeltaDocument>,
}

impl DeltaOp {
    /// Document-level whole-object replacement.
    pub fn replace_object(value: Value) -> Self {
        Self {
            member_index: DOCUMENT_MEMBER_INDEX,
            kind: DeltaKind::ReplaceObject,
            index: NO_INDEX,
            key: None,
            value: Some(value),
            nested: None,
        }
    }

    /// Shallow member replacement.
    pub fn set_member(member_index: i32, value: Value) -> Self {
        Self {
            member_index,
            kind: DeltaKind::SetMember,
            index: NO_INDEX,
            key: None,
            value: Some(value),
            nested: None,
        }
    }

    /// Member recursion carrying a sub-document.
    pub fn nested_member(member_index: i32, nested: DeltaDocument) -> Self {
        Self {
            member_index,
            kind: DeltaKind::NestedMember,
            index: NO_INDEX,
            key: None,
            value: None,
            nested: Some(nested),
        }
    }

    /// Element replacement at a sequence index.
    pub fn seq_replace_at(member_index: i32, index: i32, value: Value) -> Self {
        Self {
            member_index,
            kind: DeltaKind::SeqReplaceAt,
            index,
            key: None,
            value: Some(value),
            nested: None,
        }
    }

    /// Element insertion at a sequence index.
    pub fn seq_add_at(member_index: i32, index: i32, value: Value) -> Self {
        Self {
            member_index,
            kind: DeltaKind::SeqAddAt,
            index,
            key: None,
            value: Some(value),
            nested: None,
        }
    }

    /// Guarded element removal; `expected` is the element that must be
    /// present at `index` for the removal to take effect.
    pub fn seq_remove_at(member_index: i32, index: i32, expected: Value) -> Self {
        Self {
            member_index,
            kind: DeltaKind::SeqRemoveAt,
            index,
            key: None,
            value: Some(expected),
            nested: None,
        }
    }

    /// Element recursion at a sequence index.
    pub fn seq_nested_at(member_index: i32, index: i32, nested: DeltaDocument) -> Self {
        Self {
            member_index,
            kind: DeltaKind::SeqNestedAt,
            index,
            key: None,
            value: None,
            nested: Some(nested),
        }
    }

    /// Map entry upsert.
    pub fn dict_set(member_index: i32, key: Value, value: Value) -> Self {
        Self {
            member_index,
            kind: DeltaKind::DictSet,
            index: NO_INDEX,
            key: Some(key),
            value: Some(value),
            nested: None,
        }
    }

    /// Map entry removal.
    pub fn dict_remove(member_index: i32, key: Value) -> Self {
        Self {
            member_index,
            kind: DeltaKind::DictRemove,
            index: NO_INDEX,
            key: Some(key),
            value: None,
            nested: None,
        }
    }

    /// Map value recursion at a key.
    pub fn dict_nested(member_index: i32, key: Value, nested: DeltaDocument) -> Self {
        Self {
            member_index,
            kind: DeltaKind::DictNested,
            index: NO_INDEX,
            key: Some(key),
            value: None,
            nested: Some(nested),
        }
    }
}

/// An ordered sequence of delta operations.
///
/// A document is appended to by exactly one writer and then consumed by
/// any number of readers. Application order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaDocument {
    ops: Vec<DeltaOp>,
}

impl DeltaDocument {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty document with reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    /// Whether the document carries no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Append an operation.
    pub fn push(&mut self, op: DeltaOp) {
        self.ops.push(op);
    }

    /// Operations as a slice.
    pub fn as_ops(&self) -> &[DeltaOp] {
        &self.ops
    }

    /// Iterate operations in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeltaOp> {
        self.ops.iter()
    }

    /// Drop all operations, keeping capacity.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Total operation count including nested documents.
    pub fn deep_len(&self) -> usize {
        self.ops
            .iter()
            .map(|op| 1 + op.nested.as_ref().map_or(0, DeltaDocument::deep_len))
            .sum()
    }
}

impl<'a> IntoIterator for &'a DeltaDocument {
    type Item = &'a DeltaOp;
    type IntoIter = std::slice::Iter<'a, DeltaOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
