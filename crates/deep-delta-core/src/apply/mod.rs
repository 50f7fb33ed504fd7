//! Delta application: registry dispatch, root replacement and member
//! helpers.

/// Sequence apply
pub mod list;
/// Map apply
pub mod map;

use std::any::Any;

use crate::delta::element::DeltaElement;
use crate::document::DeltaReader;
use crate::registry;
use crate::types::delta::{DeltaKind, DeltaOp};

pub use list::{apply_list_delta, apply_list_op, apply_shared_list_delta};
pub use map::{
    apply_expando_delta, apply_map_delta, apply_shared_map_delta, apply_value_map_delta,
};

/// Apply a delta to a target of a registered type.
///
/// Returns `false` when no helper is registered; the target is
/// untouched in that case.
pub fn apply_delta<T: Any>(target: &mut T, reader: &mut DeltaReader<'_>) -> bool {
    registry::try_apply_delta_same_type(target, reader)
}

/// Extract a whole-object replacement for `T`, if the document carries
/// one.
///
/// A `ReplaceObject` op wins irrevocably: when this returns a value,
/// every other op in the document is irrelevant for the target and the
/// caller should assign the returned object and stop.
pub fn take_replace_object<T: Clone + 'static>(reader: &DeltaReader<'_>) -> Option<T> {
    reader
        .enumerate_all()
        .find(|op| op.kind == DeltaKind::ReplaceObject)
        .and_then(|op| op.value.as_ref())
        .and_then(|value| value.as_object())
        .and_then(|handle| handle.downcast_ref::<T>())
        .cloned()
}

/// Apply one member-scoped op to a member slot.
///
/// `SetMember` converts the payload and assigns; `NestedMember`
/// recurses through the element's dispatch. Payloads that do not
/// convert and kinds that do not address a plain member are ignored.
pub fn apply_member<T: DeltaElement>(slot: &mut T, op: &DeltaOp) {
    match op.kind {
        DeltaKind::SetMember => {
            if let Some(value) = op.value.as_ref().and_then(T::from_payload) {
                *slot = value;
            }
        }
        DeltaKind::NestedMember => {
            if let Some(nested) = op.nested.as_ref() {
                let mut reader = DeltaReader::new(nested);
                slot.apply_nested(&mut reader);
            }
        }
        _ => {}
    }
}
