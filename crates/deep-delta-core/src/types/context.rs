//! Per-call comparison state.

use ahash::RandomState;
use std::collections::HashSet;

use crate::types::options::ComparisonOptions;

/// Per-call state carried through a compare or compute traversal.
///
/// When cycle tracking is enabled, the context records the identity of
/// every `(left, right)` pair currently on the recursion stack. A pair
/// that is already on the stack is treated as equal, terminating the
/// recursion. Identity is address-based and order-sensitive:
/// `(L, R)` and `(R, L)` are distinct pairs.
///
/// Contexts are not shareable across threads; each compute/apply call
/// owns its own.
#[derive(Debug)]
pub struct ComparisonContext {
    /// Options configuring equality semantics for this call
    pub options: ComparisonOptions,
    cycle_tracking: bool,
    visited: HashSet<(usize, usize), RandomState>,
    stack: Vec<(usize, usize)>,
}

impl ComparisonContext {
    /// Context with cycle tracking enabled.
    pub fn new(options: ComparisonOptions) -> Self {
        Self {
            options,
            cycle_tracking: true,
            visited: HashSet::default(),
            stack: Vec::new(),
        }
    }

    /// Context with cycle tracking disabled.
    ///
    /// Cheaper for acyclic graphs; recursion over a cyclic graph will
    /// not terminate without tracking.
    pub fn no_tracking(options: ComparisonOptions) -> Self {
        Self {
            options,
            cycle_tracking: false,
            visited: HashSet::default(),
            stack: Vec::new(),
        }
    }

    /// Context with default options and cycle tracking enabled.
    pub fn with_defaults() -> Self {
        Self::new(ComparisonOptions::default())
    }

    /// Whether cycle tracking is active.
    pub fn cycle_tracking(&self) -> bool {
        self.cycle_tracking
    }

    /// Current recursion depth observed through enter/exit.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Enter a `(left, right)` pair by identity.
    ///
    /// Returns `false` when the pair is already being compared higher
    /// up the stack; the caller must treat the pair as equal and skip
    /// the matching [`ComparisonContext::exit`].
    pub fn enter(&mut self, left: usize, right: usize) -> bool {
        if !self.cycle_tracking {
            return true;
        }
        if !self.visited.insert((left, right)) {
            return false;
        }
        self.stack.push((left, right));
        true
    }

    /// Exit a pair previously entered.
    pub fn exit(&mut self, left: usize, right: usize) {
        if !self.cycle_tracking {
            return;
        }
        self.visited.remove(&(left, right));
        if self.stack.last() == Some(&(left, right)) {
            self.stack.pop();
        }
    }

    /// Enter a pair of references by address.
    pub fn enter_refs<L: ?Sized, R: ?Sized>(&mut self, left: &L, right: &R) -> bool {
        self.enter(left as *const L as *const () as usize, right as *const R as *const () as usize)
    }

    /// Exit a pair of references by address.
    pub fn exit_refs<L: ?Sized, R: ?Sized>(&mut self, left: &L, right: &R) {
        self.exit(left as *const L as *const () as usize, right as *const R as *const () as usize)
    }
}

impl Default for ComparisonContext {
    fn default() -> Self {
        Self::with_defaults()
    }
}
