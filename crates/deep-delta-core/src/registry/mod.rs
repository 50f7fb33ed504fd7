//! Process-wide helper registry.
//!
//! Maps runtime type identity to the per-type helper functions that
//! drive deep equality, delta computation and delta application.
//! Reads are concurrent and lock-free on the hot path; writes are rare
//! and bump a registry version that invalidates cached negative misses.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::document::{DeltaReader, DeltaWriter};
use crate::types::context::ComparisonContext;
use crate::types::value::{EnumTypeId, Value};

/// Type-erased comparer.
pub type CompareFn =
    Arc<dyn Fn(&dyn Any, &dyn Any, &mut ComparisonContext) -> bool + Send + Sync>;

/// Type-erased delta computation.
pub type ComputeDeltaFn =
    Arc<dyn Fn(&dyn Any, &dyn Any, &mut ComparisonContext, &mut DeltaWriter) + Send + Sync>;

/// Type-erased delta application.
pub type ApplyDeltaFn = Arc<dyn for<'d> Fn(&mut dyn Any, &mut DeltaReader<'d>) + Send + Sync>;

/// Type-erased structured-diff producer.
pub type DiffFn =
    Arc<dyn Fn(&dyn Any, &dyn Any, &mut ComparisonContext) -> Option<Diff> + Send + Sync>;

/// A structured difference report produced by a registered diff helper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    /// Differing members in traversal order
    pub entries: Vec<DiffEntry>,
}

/// One differing member in a [`Diff`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    /// Dotted member path from the root object
    pub path: String,
    /// Left-side value, when representable as a payload
    pub left: Option<Value>,
    /// Right-side value, when representable as a payload
    pub right: Option<Value>,
}

/// Helper functions registered for one type.
#[derive(Clone, Default)]
pub struct TypeDescriptor {
    /// Deep-equality comparer
    pub compare: Option<CompareFn>,
    /// Delta computation
    pub compute_delta: Option<ComputeDeltaFn>,
    /// Delta application
    pub apply_delta: Option<ApplyDeltaFn>,
    /// Structured diff, optional
    pub diff: Option<DiffFn>,
}

/// Types whose helpers can be force-registered ahead of first use.
pub trait RegisterHelpers: Any {
    /// Register this type's helpers with the process-wide registry.
    fn register();
}

struct HelperRegistry {
    entries: DashMap<TypeId, TypeDescriptor>,
    fallbacks: DashMap<TypeId, Vec<TypeId>>,
    negative: DashMap<TypeId, u64>,
    warmed: DashMap<TypeId, ()>,
    enum_types: DashMap<EnumTypeId, ()>,
    version: AtomicU64,
}

static REGISTRY: Lazy<HelperRegistry> = Lazy::new(|| HelperRegistry {
    entries: DashMap::new(),
    fallbacks: DashMap::new(),
    negative: DashMap::new(),
    warmed: DashMap::new(),
    enum_types: DashMap::new(),
    version: AtomicU64::new(0),
});

impl HelperRegistry {
    fn bump(&self, type_id: TypeId) {
        self.version.fetch_add(1, Ordering::Release);
        self.negative.remove(&type_id);
    }

    fn update(&self, type_id: TypeId, mutate: impl FnOnce(&mut TypeDescriptor)) {
        let mut entry = self.entries.entry(type_id).or_default();
        mutate(&mut entry);
        drop(entry);
        self.bump(type_id);
    }

    /// Resolve a descriptor, walking fallback edges on a direct miss.
    fn lookup(&self, type_id: TypeId) -> Option<TypeDescriptor> {
        if let Some(found) = self.entries.get(&type_id) {
            return Some(found.clone());
        }
        let version = self.version.load(Ordering::Acquire);
        if self.negative.get(&type_id).map(|v| *v) == Some(version) {
            return None;
        }
        // Explicit search over declared base/interface edges, breadth
        // first; the first registered ancestor wins and is cached under
        // the original identity.
        let mut queue: Vec<TypeId> = self
            .fallbacks
            .get(&type_id)
            .map(|edges| edges.clone())
            .unwrap_or_default();
        let mut seen = vec![type_id];
        let mut cursor = 0;
        while cursor < queue.len() {
            let candidate = queue[cursor];
            cursor += 1;
            if seen.contains(&candidate) {
                continue;
            }
            seen.push(candidate);
            if let Some(found) = self.entries.get(&candidate) {
                let descriptor = found.clone();
                drop(found);
                self.entries.insert(type_id, descriptor.clone());
                return Some(descriptor);
            }
            if let Some(edges) = self.fallbacks.get(&candidate) {
                queue.extend(edges.iter().copied());
            }
        }
        self.negative.insert(type_id, version);
        None
    }
}

/// Register a deep-equality comparer for `T`.
///
/// Registering a second comparer for the same type overwrites the first.
pub fn register_comparer<T: Any>(compare: fn(&T, &T, &mut ComparisonContext) -> bool) {
    let shim: CompareFn = Arc::new(move |left, right, ctx| {
        match (left.downcast_ref::<T>(), right.downcast_ref::<T>()) {
            (Some(l), Some(r)) => compare(l, r, ctx),
            _ => false,
        }
    });
    tracing::debug!(type_name = std::any::type_name::<T>(), "register comparer");
    REGISTRY.update(TypeId::of::<T>(), |d| d.compare = Some(shim));
}

/// Register delta computation and application for `T`.
pub fn register_delta<T: Any>(
    compute: fn(&T, &T, &mut ComparisonContext, &mut DeltaWriter),
    apply: fn(&mut T, &mut DeltaReader<'_>),
) {
    let compute_shim: ComputeDeltaFn = Arc::new(move |left, right, ctx, writer| {
        if let (Some(l), Some(r)) = (left.downcast_ref::<T>(), right.downcast_ref::<T>()) {
            compute(l, r, ctx, writer);
        }
    });
    let apply_shim: ApplyDeltaFn = Arc::new(move |target, reader| {
        if let Some(t) = target.downcast_mut::<T>() {
            apply(t, reader);
        }
    });
    tracing::debug!(type_name = std::any::type_name::<T>(), "register delta helpers");
    REGISTRY.update(TypeId::of::<T>(), |d| {
        d.compute_delta = Some(compute_shim);
        d.apply_delta = Some(apply_shim);
    });
}

/// Register a structured-diff producer for `T`.
pub fn register_diff<T: Any>(diff: fn(&T, &T, &mut ComparisonContext) -> Option<Diff>) {
    let shim: DiffFn = Arc::new(move |left, right, ctx| {
        match (left.downcast_ref::<T>(), right.downcast_ref::<T>()) {
            (Some(l), Some(r)) => diff(l, r, ctx),
            _ => None,
        }
    });
    REGISTRY.update(TypeId::of::<T>(), |d| d.diff = Some(shim));
}

/// Declare that lookups for `From` may be served by helpers registered
/// for `To` (a base type or implemented interface in the source schema).
pub fn register_fallback<From: Any, To: Any>() {
    REGISTRY
        .fallbacks
        .entry(TypeId::of::<From>())
        .or_default()
        .push(TypeId::of::<To>());
    REGISTRY.bump(TypeId::of::<From>());
}

/// Run `T`'s helper registration exactly once per process.
pub fn warm_up<T: RegisterHelpers>() {
    if REGISTRY.warmed.insert(TypeId::of::<T>(), ()).is_none() {
        tracing::debug!(type_name = std::any::type_name::<T>(), "warm up helpers");
        T::register();
    }
}

/// Whether any helper is registered (directly or via fallback) for `T`.
pub fn is_registered<T: Any>() -> bool {
    REGISTRY.lookup(TypeId::of::<T>()).is_some()
}

/// Compare two type-erased values of the same runtime type through the
/// registered comparer. `None` when no comparer can be resolved;
/// `Some(false)` when the runtime types differ.
pub fn try_compare_same_type(
    left: &dyn Any,
    right: &dyn Any,
    ctx: &mut ComparisonContext,
) -> Option<bool> {
    if left.type_id() != right.type_id() {
        return Some(false);
    }
    let descriptor = REGISTRY.lookup(left.type_id())?;
    let compare = descriptor.compare?;
    Some(compare(left, right, ctx))
}

/// Compute a delta between two type-erased values of the same runtime
/// type. `false` when no helper can be resolved; the caller is expected
/// to degrade to a shallow member replacement.
pub fn compute_delta_same_type(
    left: &dyn Any,
    right: &dyn Any,
    ctx: &mut ComparisonContext,
    writer: &mut DeltaWriter,
) -> bool {
    if left.type_id() != right.type_id() {
        return false;
    }
    let Some(descriptor) = REGISTRY.lookup(left.type_id()) else {
        return false;
    };
    let Some(compute) = descriptor.compute_delta else {
        return false;
    };
    compute(left, right, ctx, writer);
    true
}

/// Apply a delta to a type-erased target through its registered helper.
/// `false` when no helper can be resolved; the target is untouched.
pub fn try_apply_delta_same_type(target: &mut dyn Any, reader: &mut DeltaReader<'_>) -> bool {
    let type_id = (*target).type_id();
    let Some(descriptor) = REGISTRY.lookup(type_id) else {
        tracing::trace!(?type_id, "apply skipped: no registered helper");
        return false;
    };
    let Some(apply) = descriptor.apply_delta else {
        return false;
    };
    apply(target, reader);
    true
}

/// Produce a structured diff for two values of a registered type.
pub fn try_get_diff<T: Any>(left: &T, right: &T, ctx: &mut ComparisonContext) -> Option<Diff> {
    let descriptor = REGISTRY.lookup(TypeId::of::<T>())?;
    let diff = descriptor.diff?;
    diff(left, right, ctx)
}

/// Record an enum type as known to this process.
///
/// Decode resolves enum identities against this set: unresolved enum
/// *values* are decode errors, unresolved enum *type-specs* degrade to
/// the object spec.
pub fn register_enum_type(ty: EnumTypeId) {
    REGISTRY.enum_types.insert(ty, ());
}

/// Whether an enum identity is known to this process.
pub fn is_enum_type_registered(ty: &EnumTypeId) -> bool {
    REGISTRY.enum_types.contains_key(ty)
}
