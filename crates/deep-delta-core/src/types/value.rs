//! Tagged value universe for delta payloads.
//!
//! Every payload a delta operation can carry is a [`Value`]. The set is
//! closed: scalars, strings, temporal values, decimals, enums, GUIDs,
//! byte blobs, typed lists and maps, and opaque user objects. User
//! objects never reach the wire; they participate in deltas only through
//! nested scopes dispatched via the helper registry.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::compare::scalar;
use crate::types::context::ComparisonContext;
use crate::types::temporal::{DateTime, DateTimeOffset, TimeSpan};

/// Codes for the built-in value types referenced by type-specs.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTypeCode {
    /// Boolean
    Bool = 0,
    /// Signed 8-bit integer
    I8 = 1,
    /// Signed 16-bit integer
    I16 = 2,
    /// Signed 32-bit integer
    I32 = 3,
    /// Signed 64-bit integer
    I64 = 4,
    /// Unsigned 8-bit integer
    U8 = 5,
    /// Unsigned 16-bit integer
    U16 = 6,
    /// Unsigned 32-bit integer
    U32 = 7,
    /// Unsigned 64-bit integer
    U64 = 8,
    /// 16-bit code unit
    Char = 9,
    /// 32-bit IEEE float
    F32 = 10,
    /// 64-bit IEEE float
    F64 = 11,
    /// 128-bit decimal
    Decimal = 12,
    /// UTF-8 string
    String = 13,
    /// 128-bit GUID
    Guid = 14,
    /// Tick-based date-time with kind
    DateTime = 15,
    /// Tick-based duration
    TimeSpan = 16,
    /// Date-time with explicit UTC offset
    DateTimeOffset = 17,
}

impl KnownTypeCode {
    /// Convert a wire byte back to a code.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(KnownTypeCode::Bool),
            1 => Some(KnownTypeCode::I8),
            2 => Some(KnownTypeCode::I16),
            3 => Some(KnownTypeCode::I32),
            4 => Some(KnownTypeCode::I64),
            5 => Some(KnownTypeCode::U8),
            6 => Some(KnownTypeCode::U16),
            7 => Some(KnownTypeCode::U32),
            8 => Some(KnownTypeCode::U64),
            9 => Some(KnownTypeCode::Char),
            10 => Some(KnownTypeCode::F32),
            11 => Some(KnownTypeCode::F64),
            12 => Some(KnownTypeCode::Decimal),
            13 => Some(KnownTypeCode::String),
            14 => Some(KnownTypeCode::Guid),
            15 => Some(KnownTypeCode::DateTime),
            16 => Some(KnownTypeCode::TimeSpan),
            17 => Some(KnownTypeCode::DateTimeOffset),
            _ => None,
        }
    }
}

/// Identity of an enum type: full name, defining module and a stable
/// 128-bit module version id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumTypeId {
    /// Namespace-qualified type name
    pub full_name: Arc<str>,
    /// Simple name of the defining module/assembly
    pub module: Arc<str>,
    /// Module version id; resolution keys on `(module, module_version)`
    pub module_version: Uuid,
}

impl EnumTypeId {
    /// Construct an identity.
    pub fn new(full_name: impl Into<Arc<str>>, module: impl Into<Arc<str>>, module_version: Uuid) -> Self {
        Self {
            full_name: full_name.into(),
            module: module.into(),
            module_version,
        }
    }
}

/// Underlying integral carried by an enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumUnderlying {
    /// i8-backed enum
    I8(i8),
    /// i16-backed enum
    I16(i16),
    /// i32-backed enum
    I32(i32),
    /// i64-backed enum
    I64(i64),
    /// u8-backed enum
    U8(u8),
    /// u16-backed enum
    U16(u16),
    /// u32-backed enum
    U32(u32),
    /// u64-backed enum
    U64(u64),
}

impl EnumUnderlying {
    /// Wire code of the underlying type.
    pub fn code(self) -> u8 {
        match self {
            EnumUnderlying::I8(_) => 0,
            EnumUnderlying::I16(_) => 1,
            EnumUnderlying::I32(_) => 2,
            EnumUnderlying::I64(_) => 3,
            EnumUnderlying::U8(_) => 4,
            EnumUnderlying::U16(_) => 5,
            EnumUnderlying::U32(_) => 6,
            EnumUnderlying::U64(_) => 7,
        }
    }

    /// Widen to a common integral for equality.
    pub fn as_i128(self) -> i128 {
        match self {
            EnumUnderlying::I8(v) => i128::from(v),
            EnumUnderlying::I16(v) => i128::from(v),
            EnumUnderlying::I32(v) => i128::from(v),
            EnumUnderlying::I64(v) => i128::from(v),
            EnumUnderlying::U8(v) => i128::from(v),
            EnumUnderlying::U16(v) => i128::from(v),
            EnumUnderlying::U32(v) => i128::from(v),
            EnumUnderlying::U64(v) => i128::from(v),
        }
    }
}

/// An enum value: underlying integral plus type identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Type identity
    pub ty: EnumTypeId,
    /// Underlying integral value
    pub value: EnumUnderlying,
}

/// Element/key/value type descriptor for lists and maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// A built-in value type
    Known(KnownTypeCode),
    /// An enum type, by identity
    Enum(EnumTypeId),
    /// Any other (user-object) type
    Object,
}

/// A typed list payload: element spec plus items.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    /// Element type
    pub elem: TypeSpec,
    /// Items in order
    pub items: Vec<Value>,
}

/// A typed map payload: key/value specs plus entries.
///
/// Entries preserve source order; key lookup is by structural equality.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMap {
    /// Key type
    pub key: TypeSpec,
    /// Value type
    pub value: TypeSpec,
    /// Entries in source order
    pub entries: Vec<(Value, Value)>,
}

impl ValueMap {
    /// Look up a value by key under default key equality.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Behavior required of opaque user objects held in a [`Value`].
///
/// Implemented automatically for any `Clone + Debug + Send + Sync`
/// type; the handle layer uses it for downcasting and clone-on-write.
pub trait ObjectValue: Send + Sync + fmt::Debug + 'static {
    /// View as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Mutable view as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Clone into a fresh boxed object.
    fn clone_object(&self) -> Box<dyn ObjectValue>;
}

impl<T> ObjectValue for T
where
    T: Send + Sync + fmt::Debug + Clone + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_object(&self) -> Box<dyn ObjectValue> {
        Box::new(self.clone())
    }
}

/// Shared handle to an opaque user object.
///
/// Cloning the handle shares the underlying object; [`ObjectHandle::make_mut`]
/// clones the object when the handle is not the unique owner.
#[derive(Clone, Debug)]
pub struct ObjectHandle {
    inner: Arc<dyn ObjectValue>,
}

impl ObjectHandle {
    /// Wrap a concrete object.
    pub fn new<T: ObjectValue>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Runtime type identity of the wrapped object.
    pub fn runtime_type(&self) -> TypeId {
        self.inner.as_any().type_id()
    }

    /// Downcast to a concrete reference.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Borrow the type-erased object.
    pub fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }

    /// Identity comparison of two handles.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the wrapped object, used for cycle tracking.
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Mutable access to the wrapped object, cloning first when shared.
    pub fn make_mut(&mut self) -> &mut dyn ObjectValue {
        if Arc::get_mut(&mut self.inner).is_none() {
            self.inner = Arc::from(self.inner.clone_object());
        }
        // unique at this point
        Arc::get_mut(&mut self.inner).unwrap()
    }
}

/// A delta payload value.
///
/// `PartialEq` on `Value` is document equality: floats compare by bit
/// pattern (NaN-stable) and objects compare by identity. Semantic
/// equality under [`crate::ComparisonOptions`] is [`Value::equals_with`].
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed 8-bit integer
    I8(i8),
    /// Signed 16-bit integer
    I16(i16),
    /// Signed 32-bit integer
    I32(i32),
    /// Signed 64-bit integer
    I64(i64),
    /// Unsigned 8-bit integer
    U8(u8),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// 16-bit code unit
    Char(u16),
    /// 32-bit IEEE float
    F32(f32),
    /// 64-bit IEEE float
    F64(f64),
    /// 128-bit decimal
    Decimal(Decimal),
    /// UTF-8 string
    Str(Arc<str>),
    /// 128-bit GUID
    Guid(Uuid),
    /// Tick-based date-time
    DateTime(DateTime),
    /// Tick-based duration
    TimeSpan(TimeSpan),
    /// Date-time with explicit offset
    DateTimeOffset(DateTimeOffset),
    /// Enum value with type identity
    Enum(EnumValue),
    /// Byte blob
    Bytes(Arc<[u8]>),
    /// Typed list
    List(ValueList),
    /// Typed map
    Map(ValueMap),
    /// Opaque user object; never serialized inline
    Object(ObjectHandle),
}

impl Value {
    /// String value from anything string-like.
    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Value::Str(value.into())
    }

    /// Byte-blob value.
    pub fn bytes(value: impl Into<Arc<[u8]>>) -> Self {
        Value::Bytes(value.into())
    }

    /// Wrap a user object.
    pub fn object<T: ObjectValue>(value: T) -> Self {
        Value::Object(ObjectHandle::new(value))
    }

    /// Borrow the object handle when this is an object value.
    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            Value::Object(handle) => Some(handle),
            _ => None,
        }
    }

    /// Borrow the string when this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view for cross-type comparison, promoting to `f64`.
    fn as_numeric(&self) -> Option<f64> {
        match self {
            Value::I8(v) => Some(f64::from(*v)),
            Value::I16(v) => Some(f64::from(*v)),
            Value::I32(v) => Some(f64::from(*v)),
            Value::I64(v) => Some(*v as f64),
            Value::U8(v) => Some(f64::from(*v)),
            Value::U16(v) => Some(f64::from(*v)),
            Value::U32(v) => Some(f64::from(*v)),
            Value::U64(v) => Some(*v as f64),
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            Value::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    /// Semantic equality under the context's options.
    ///
    /// Same-variant scalars use the configured string/float/decimal
    /// semantics. Mixed numeric variants are promoted to `f64` before
    /// comparing. Containers recurse; object pairs dispatch through the
    /// helper registry with cycle entry around the pair.
    pub fn equals_with(&self, other: &Value, ctx: &mut ComparisonContext) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => scalar::f32_equal(*a, *b, &ctx.options),
            (Value::F64(a), Value::F64(b)) => scalar::f64_equal(*a, *b, &ctx.options),
            (Value::Decimal(a), Value::Decimal(b)) => scalar::decimal_equal(*a, *b, &ctx.options),
            (Value::Str(a), Value::Str(b)) => {
                scalar::strings_equal(a, b, ctx.options.string_comparison)
            }
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
            (Value::DateTimeOffset(a), Value::DateTimeOffset(b)) => a.strict_eq(*b),
            (Value::Enum(a), Value::Enum(b)) => {
                a.ty == b.ty && a.value.as_i128() == b.value.as_i128()
            }
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if a.items.len() != b.items.len() {
                    return false;
                }
                if !ctx.enter(self as *const Value as usize, other as *const Value as usize) {
                    return true;
                }
                let equal = a
                    .items
                    .iter()
                    .zip(b.items.iter())
                    .all(|(x, y)| x.equals_with(y, ctx));
                ctx.exit(self as *const Value as usize, other as *const Value as usize);
                equal
            }
            (Value::Map(a), Value::Map(b)) => {
                if a.entries.len() != b.entries.len() {
                    return false;
                }
                if !ctx.enter(self as *const Value as usize, other as *const Value as usize) {
                    return true;
                }
                let equal = a.entries.iter().all(|(k, v)| {
                    b.entries
                        .iter()
                        .find(|(bk, _)| bk.equals_with(k, ctx))
                        .map(|(_, bv)| v.equals_with(bv, ctx))
                        .unwrap_or(false)
                });
                ctx.exit(self as *const Value as usize, other as *const Value as usize);
                equal
            }
            (Value::Object(a), Value::Object(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                if a.runtime_type() != b.runtime_type() {
                    return false;
                }
                if !ctx.enter(a.address(), b.address()) {
                    return true;
                }
                let equal = crate::registry::try_compare_same_type(a.as_any(), b.as_any(), ctx)
                    .unwrap_or(false);
                ctx.exit(a.address(), b.address());
                equal
            }
            (a, b) => match (a.as_numeric(), b.as_numeric()) {
                (Some(x), Some(y)) => scalar::f64_equal(x, y, &ctx.options),
                _ => false,
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
            (Value::DateTimeOffset(a), Value::DateTimeOffset(b)) => {
                a.local_ticks == b.local_ticks && a.offset_minutes == b.offset_minutes
            }
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Conversion bridge between native member values and delta payloads.
///
/// The descriptor layer uses this to move member values into operations
/// during compute and back out during apply.
pub trait DeltaValue: Clone + 'static {
    /// Convert to a payload value.
    fn to_value(&self) -> Value;
    /// Recover from a payload value; `None` on a shape mismatch.
    fn from_value(value: &Value) -> Option<Self>;
    /// Type spec describing this type in list/map payloads.
    fn type_spec() -> TypeSpec {
        TypeSpec::Object
    }
}

macro_rules! impl_delta_value {
    ( $($ty:ty => $variant:ident, $code:ident);* $(;)? ) => {
        $(
            impl DeltaValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }

                fn type_spec() -> TypeSpec {
                    TypeSpec::Known(KnownTypeCode::$code)
                }
            }
        )*
    };
}

impl_delta_value! {
    bool => Bool, Bool;
    i8 => I8, I8;
    i16 => I16, I16;
    i32 => I32, I32;
    i64 => I64, I64;
    u8 => U8, U8;
    u16 => U16, U16;
    u32 => U32, U32;
    u64 => U64, U64;
    f32 => F32, F32;
    f64 => F64, F64;
    Decimal => Decimal, Decimal;
    Uuid => Guid, Guid;
    DateTime => DateTime, DateTime;
    TimeSpan => TimeSpan, TimeSpan;
    DateTimeOffset => DateTimeOffset, DateTimeOffset;
}

impl DeltaValue for String {
    fn to_value(&self) -> Value {
        Value::Str(Arc::from(self.as_str()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.to_string()),
            _ => None,
        }
    }

    fn type_spec() -> TypeSpec {
        TypeSpec::Known(KnownTypeCode::String)
    }
}

impl DeltaValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(Arc::from(self.as_slice()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b.to_vec()),
            _ => None,
        }
    }
}

impl DeltaValue for EnumValue {
    fn to_value(&self) -> Value {
        Value::Enum(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Enum(e) => Some(e.clone()),
            _ => None,
        }
    }

    fn type_spec() -> TypeSpec {
        TypeSpec::Object
    }
}

impl DeltaValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: DeltaValue> DeltaValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn type_spec() -> TypeSpec {
        T::type_spec()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
