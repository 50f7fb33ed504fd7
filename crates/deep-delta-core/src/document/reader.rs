//! Random-access and streaming reads over a delta document.

use crate::types::delta::{DeltaDocument, DeltaOp};

/// Reader over a borrowed [`DeltaDocument`].
///
/// Multiple independent readers over the same document are allowed; a
/// reader never mutates the document. Streaming position and random
/// access are independent of one another.
#[derive(Debug, Clone)]
pub struct DeltaReader<'d> {
    ops: &'d [DeltaOp],
    pos: usize,
}

impl<'d> DeltaReader<'d> {
    /// Reader positioned at the start of a document.
    pub fn new(doc: &'d DeltaDocument) -> Self {
        Self {
            ops: doc.as_ops(),
            pos: 0,
        }
    }

    /// Reader over a raw op slice.
    pub fn from_ops(ops: &'d [DeltaOp]) -> Self {
        Self { ops, pos: 0 }
    }

    /// All operations, in application order.
    pub fn as_ops(&self) -> &'d [DeltaOp] {
        self.ops
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the document carries no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Current streaming position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read the next operation, advancing the streaming position.
    pub fn try_read(&mut self) -> Option<&'d DeltaOp> {
        let op = self.ops.get(self.pos)?;
        self.pos += 1;
        Some(op)
    }

    /// Rewind the streaming position to the start.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Iterate every operation regardless of streaming position.
    pub fn enumerate_all(&self) -> impl Iterator<Item = &'d DeltaOp> {
        self.ops.iter()
    }

    /// Iterate the operations addressing one member.
    pub fn enumerate_member(&self, member_index: i32) -> impl Iterator<Item = &'d DeltaOp> {
        self.ops
            .iter()
            .filter(move |op| op.member_index == member_index)
    }
}
