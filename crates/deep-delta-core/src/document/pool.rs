//! Per-thread document pool.
//!
//! Nested scopes rent sub-documents at every recursion step; the pool
//! keeps cleared instances around so steady-state compute does not
//! allocate. Ops that take ownership of a nested document remove it
//! from circulation permanently.

use std::cell::RefCell;

use crate::constants::DOCUMENT_POOL_CAPACITY;
use crate::types::delta::DeltaDocument;

thread_local! {
    static POOL: RefCell<Vec<DeltaDocument>> = const { RefCell::new(Vec::new()) };
}

/// Rent a cleared document, reusing a pooled instance when available.
pub fn rent(capacity_hint: usize) -> DeltaDocument {
    POOL.with(|pool| {
        pool.borrow_mut()
            .pop()
            .unwrap_or_else(|| DeltaDocument::with_capacity(capacity_hint))
    })
}

/// Return a document to this thread's pool.
///
/// The document is cleared before it becomes available again. Beyond
/// the pool capacity the instance is simply dropped.
pub fn recycle(mut doc: DeltaDocument) {
    doc.clear();
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        if pool.len() < DOCUMENT_POOL_CAPACITY {
            pool.push(doc);
        }
    });
}
