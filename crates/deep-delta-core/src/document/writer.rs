//! Append-only delta writer with pooled nested scopes.

use std::mem;
use std::ops::{Deref, DerefMut};

use crate::document::pool;
use crate::types::delta::{DeltaDocument, DeltaOp};
use crate::types::value::Value;

/// Append-only writer owning one [`DeltaDocument`].
///
/// A writer is single-threaded and owns its document exclusively until
/// [`DeltaWriter::finish`] transfers it out. Nested scopes opened
/// through the `begin_*` methods are strictly LIFO; the borrow rules
/// enforce that a parent writer cannot emit while a scope is open.
#[derive(Debug, Default)]
pub struct DeltaWriter {
    doc: DeltaDocument,
}

/// Which nested op a scope commits into its parent on close.
#[derive(Debug, Clone, Copy)]
enum ScopeKind {
    Member,
    SeqAt,
    DictKey,
}

impl DeltaWriter {
    /// Writer over a pooled, empty document.
    pub fn new() -> Self {
        Self { doc: pool::rent(0) }
    }

    /// Writer with an operation-count hint for the underlying document.
    pub fn with_capacity(capacity_hint: usize) -> Self {
        Self {
            doc: pool::rent(capacity_hint),
        }
    }

    /// Whether nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Number of operations emitted so far.
    pub fn len(&self) -> usize {
        self.doc.len()
    }

    /// Emit a whole-object replacement at the document root.
    pub fn write_replace_object(&mut self, value: Value) {
        self.doc.push(DeltaOp::replace_object(value));
    }

    /// Emit a shallow member replacement.
    pub fn write_set_member(&mut self, member_index: i32, value: Value) {
        self.doc.push(DeltaOp::set_member(member_index, value));
    }

    /// Emit a sequence element replacement.
    pub fn write_seq_replace_at(&mut self, member_index: i32, index: i32, value: Value) {
        self.doc.push(DeltaOp::seq_replace_at(member_index, index, value));
    }

    /// Emit a sequence insertion.
    pub fn write_seq_add_at(&mut self, member_index: i32, index: i32, value: Value) {
        self.doc.push(DeltaOp::seq_add_at(member_index, index, value));
    }

    /// Emit a guarded sequence removal carrying the expected element.
    pub fn write_seq_remove_at(&mut self, member_index: i32, index: i32, expected: Value) {
        self.doc.push(DeltaOp::seq_remove_at(member_index, index, expected));
    }

    /// Emit a map upsert.
    pub fn write_dict_set(&mut self, member_index: i32, key: Value, value: Value) {
        self.doc.push(DeltaOp::dict_set(member_index, key, value));
    }

    /// Emit a map removal.
    pub fn write_dict_remove(&mut self, member_index: i32, key: Value) {
        self.doc.push(DeltaOp::dict_remove(member_index, key));
    }

    /// Open a nested scope recursing into a member.
    ///
    /// On close the scope either vanishes (sub-document empty, returned
    /// to the pool) or commits exactly one `NestedMember` op that takes
    /// ownership of the sub-document.
    pub fn begin_nested_member(&mut self, member_index: i32) -> NestedScope<'_> {
        NestedScope::open(self, ScopeKind::Member, member_index, -1, None)
    }

    /// Open a nested scope recursing into a sequence element.
    pub fn begin_seq_nested_at(&mut self, member_index: i32, index: i32) -> NestedScope<'_> {
        NestedScope::open(self, ScopeKind::SeqAt, member_index, index, None)
    }

    /// Open a nested scope recursing into a map value.
    pub fn begin_dict_nested(&mut self, member_index: i32, key: Value) -> NestedScope<'_> {
        NestedScope::open(self, ScopeKind::DictKey, member_index, -1, Some(key))
    }

    /// Transfer the document out, consuming the writer.
    pub fn finish(mut self) -> DeltaDocument {
        mem::take(&mut self.doc)
    }
}

/// A nested sub-document scope with guaranteed release.
///
/// Dereferences to a [`DeltaWriter`] so all emitters and further scopes
/// are available inside. Closing is automatic on drop.
#[derive(Debug)]
pub struct NestedScope<'a> {
    parent: &'a mut DeltaWriter,
    child: DeltaWriter,
    kind: ScopeKind,
    member_index: i32,
    index: i32,
    key: Option<Value>,
}

impl<'a> NestedScope<'a> {
    fn open(
        parent: &'a mut DeltaWriter,
        kind: ScopeKind,
        member_index: i32,
        index: i32,
        key: Option<Value>,
    ) -> Self {
        Self {
            parent,
            child: DeltaWriter::new(),
            kind,
            member_index,
            index,
            key,
        }
    }
}

impl Deref for NestedScope<'_> {
    type Target = DeltaWriter;

    fn deref(&self) -> &DeltaWriter {
        &self.child
    }
}

impl DerefMut for NestedScope<'_> {
    fn deref_mut(&mut self) -> &mut DeltaWriter {
        &mut self.child
    }
}

impl Drop for NestedScope<'_> {
    fn drop(&mut self) {
        let doc = mem::take(&mut self.child.doc);
        if doc.is_empty() {
            pool::recycle(doc);
            return;
        }
        let op = match self.kind {
            ScopeKind::Member => DeltaOp::nested_member(self.member_index, doc),
            ScopeKind::SeqAt => DeltaOp::seq_nested_at(self.member_index, self.index, doc),
            ScopeKind::DictKey => {
                // key is always present for dict scopes
                DeltaOp::dict_nested(self.member_index, self.key.take().unwrap_or(Value::Null), doc)
            }
        };
        self.parent.doc.push(op);
    }
}
