//! Element behavior required by the sequence and map algorithms.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::compare::scalar;
use crate::document::{DeltaReader, DeltaWriter};
use crate::registry;
use crate::types::context::ComparisonContext;
use crate::types::temporal::{DateTime, DateTimeOffset, TimeSpan};
use crate::types::value::{
    DeltaValue, EnumValue, KnownTypeCode, ObjectHandle, TypeSpec, Value, ValueList,
};

/// Behavior the diff/apply algorithms need from container elements.
///
/// `element_eq` is the options-aware equality used for alignment and
/// idempotence guards. `compute_nested` writes a sub-delta when the
/// element shape supports recursion; implementations must write nothing
/// and return `false` when they cannot recurse (the algorithms then
/// fall back to whole-element replacement).
pub trait DeltaElement: Clone + 'static {
    /// Options-aware equality.
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool;

    /// Convert to a delta payload.
    fn to_payload(&self) -> Value;

    /// Recover from a delta payload; `None` on a shape mismatch.
    fn from_payload(value: &Value) -> Option<Self>;

    /// Type spec describing elements of this type in list payloads.
    fn element_spec() -> TypeSpec {
        TypeSpec::Object
    }

    /// Write a nested delta from `self` to `other` into `writer`.
    ///
    /// Returns `true` when the element shape supports recursion (even
    /// if no ops were written because the difference is not
    /// expressible); `false` otherwise.
    fn compute_nested(
        &self,
        _other: &Self,
        _ctx: &mut ComparisonContext,
        _writer: &mut DeltaWriter,
    ) -> bool {
        false
    }

    /// Apply a nested delta in place. Returns `true` when handled.
    fn apply_nested(&mut self, _reader: &mut DeltaReader<'_>) -> bool {
        false
    }
}

macro_rules! impl_exact_element {
    ( $($ty:ty),* $(,)? ) => {
        $(
            impl DeltaElement for $ty {
                fn element_eq(&self, other: &Self, _ctx: &mut ComparisonContext) -> bool {
                    self == other
                }

                fn to_payload(&self) -> Value {
                    DeltaValue::to_value(self)
                }

                fn from_payload(value: &Value) -> Option<Self> {
                    <$ty as DeltaValue>::from_value(value)
                }

                fn element_spec() -> TypeSpec {
                    <$ty as DeltaValue>::type_spec()
                }
            }
        )*
    };
}

impl_exact_element!(bool, i8, i16, i32, i64, u8, u16, u32, u64, Uuid, DateTime, TimeSpan, EnumValue);

impl DeltaElement for f32 {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        scalar::f32_equal(*self, *other, &ctx.options)
    }

    fn to_payload(&self) -> Value {
        Value::F32(*self)
    }

    fn from_payload(value: &Value) -> Option<Self> {
        match value {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    fn element_spec() -> TypeSpec {
        TypeSpec::Known(KnownTypeCode::F32)
    }
}

impl DeltaElement for f64 {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        scalar::f64_equal(*self, *other, &ctx.options)
    }

    fn to_payload(&self) -> Value {
        Value::F64(*self)
    }

    fn from_payload(value: &Value) -> Option<Self> {
        match value {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    fn element_spec() -> TypeSpec {
        TypeSpec::Known(KnownTypeCode::F64)
    }
}

impl DeltaElement for Decimal {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        scalar::decimal_equal(*self, *other, &ctx.options)
    }

    fn to_payload(&self) -> Value {
        Value::Decimal(*self)
    }

    fn from_payload(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    fn element_spec() -> TypeSpec {
        TypeSpec::Known(KnownTypeCode::Decimal)
    }
}

impl DeltaElement for String {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        scalar::strings_equal(self, other, ctx.options.string_comparison)
    }

    fn to_payload(&self) -> Value {
        DeltaValue::to_value(self)
    }

    fn from_payload(value: &Value) -> Option<Self> {
        <String as DeltaValue>::from_value(value)
    }

    fn element_spec() -> TypeSpec {
        TypeSpec::Known(KnownTypeCode::String)
    }
}

impl DeltaElement for DateTimeOffset {
    fn element_eq(&self, other: &Self, _ctx: &mut ComparisonContext) -> bool {
        self.strict_eq(*other)
    }

    fn to_payload(&self) -> Value {
        Value::DateTimeOffset(*self)
    }

    fn from_payload(value: &Value) -> Option<Self> {
        match value {
            Value::DateTimeOffset(v) => Some(*v),
            _ => None,
        }
    }

    fn element_spec() -> TypeSpec {
        TypeSpec::Known(KnownTypeCode::DateTimeOffset)
    }
}

/// Optional elements: `None` pairs are equal, mixed pairs never recurse.
impl<T: DeltaElement> DeltaElement for Option<T> {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.element_eq(b, ctx),
            _ => false,
        }
    }

    fn to_payload(&self) -> Value {
        match self {
            Some(v) => v.to_payload(),
            None => Value::Null,
        }
    }

    fn from_payload(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_payload(other).map(Some),
        }
    }

    fn element_spec() -> TypeSpec {
        T::element_spec()
    }

    fn compute_nested(
        &self,
        other: &Self,
        ctx: &mut ComparisonContext,
        writer: &mut DeltaWriter,
    ) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.compute_nested(b, ctx, writer),
            _ => false,
        }
    }

    fn apply_nested(&mut self, reader: &mut DeltaReader<'_>) -> bool {
        match self {
            Some(v) => v.apply_nested(reader),
            None => false,
        }
    }
}

/// Polymorphic object elements dispatch through the helper registry.
impl DeltaElement for ObjectHandle {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.runtime_type() != other.runtime_type() {
            return false;
        }
        if !ctx.enter(self.address(), other.address()) {
            return true;
        }
        let equal =
            registry::try_compare_same_type(self.as_any(), other.as_any(), ctx).unwrap_or(false);
        ctx.exit(self.address(), other.address());
        equal
    }

    fn to_payload(&self) -> Value {
        Value::Object(self.clone())
    }

    fn from_payload(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }

    fn compute_nested(
        &self,
        other: &Self,
        ctx: &mut ComparisonContext,
        writer: &mut DeltaWriter,
    ) -> bool {
        if self.runtime_type() != other.runtime_type() {
            return false;
        }
        registry::compute_delta_same_type(self.as_any(), other.as_any(), ctx, writer)
    }

    fn apply_nested(&mut self, reader: &mut DeltaReader<'_>) -> bool {
        registry::try_apply_delta_same_type(self.make_mut().as_any_mut(), reader)
    }
}

/// Untyped values: equality follows the context options; maps and
/// same-type registered objects recurse.
impl DeltaElement for Value {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        self.equals_with(other, ctx)
    }

    fn to_payload(&self) -> Value {
        self.clone()
    }

    fn from_payload(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn compute_nested(
        &self,
        other: &Self,
        ctx: &mut ComparisonContext,
        writer: &mut DeltaWriter,
    ) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.compute_nested(b, ctx, writer),
            (Value::Map(a), Value::Map(b)) => {
                crate::delta::map::compute_value_map_delta(
                    writer,
                    crate::constants::DOCUMENT_MEMBER_INDEX,
                    a,
                    b,
                    ctx,
                    true,
                );
                true
            }
            _ => false,
        }
    }

    fn apply_nested(&mut self, reader: &mut DeltaReader<'_>) -> bool {
        match self {
            Value::Object(handle) => handle.apply_nested(reader),
            Value::Map(map) => {
                crate::apply::map::apply_value_map_delta(map, reader.as_ops());
                true
            }
            _ => false,
        }
    }
}

/// Nested sequences compare element-wise and replace wholesale; deeper
/// recursion flattens through payloads.
impl<T: DeltaElement> DeltaElement for Vec<T> {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.element_eq(b, ctx))
    }

    fn to_payload(&self) -> Value {
        Value::List(ValueList {
            elem: T::element_spec(),
            items: self.iter().map(DeltaElement::to_payload).collect(),
        })
    }

    fn from_payload(value: &Value) -> Option<Self> {
        match value {
            Value::List(list) => list.items.iter().map(T::from_payload).collect(),
            _ => None,
        }
    }
}
