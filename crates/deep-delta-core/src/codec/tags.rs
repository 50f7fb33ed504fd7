//! Wire tags for values and type-specs, one byte each.

/// Value tag: the first byte of every encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    /// Absent value
    Null = 0,
    /// Boolean false, no payload
    BoolFalse = 1,
    /// Boolean true, no payload
    BoolTrue = 2,
    /// Zigzag varint
    I8 = 3,
    /// Zigzag varint
    I16 = 4,
    /// Zigzag varint
    I32 = 5,
    /// Zigzag varint
    I64 = 6,
    /// Varint
    U8 = 7,
    /// Varint
    U16 = 8,
    /// Varint
    U32 = 9,
    /// Varint
    U64 = 10,
    /// u16 little-endian code unit
    Char16 = 11,
    /// u32 bit pattern, little-endian
    F32 = 12,
    /// u64 bit pattern, little-endian
    F64 = 13,
    /// Four u32 little-endian words: lo, mid, hi, flags
    Decimal = 14,
    /// Varint byte length + UTF-8 bytes
    StringInline = 15,
    /// Varint string-table id
    StringRef = 16,
    /// 16 bytes
    Guid16 = 17,
    /// Ticks and kind packed in one i64, little-endian
    DateTimeBin64 = 18,
    /// Zigzag varint ticks
    TimeSpanTicks = 19,
    /// Zigzag varint ticks + zigzag varint offset minutes
    DateTimeOffset = 20,
    /// Enum-type reference + underlying code + integral
    Enum = 21,
    /// Varint byte length + bytes
    ByteArray = 22,
    /// Element type-spec + varint length + elements
    Array = 23,
    /// Element type-spec + varint length + elements
    List = 24,
    /// Key and value type-specs + varint length + pairs
    Dictionary = 25,
}

impl ValueTag {
    /// Convert a wire byte back to a tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ValueTag::Null),
            1 => Some(ValueTag::BoolFalse),
            2 => Some(ValueTag::BoolTrue),
            3 => Some(ValueTag::I8),
            4 => Some(ValueTag::I16),
            5 => Some(ValueTag::I32),
            6 => Some(ValueTag::I64),
            7 => Some(ValueTag::U8),
            8 => Some(ValueTag::U16),
            9 => Some(ValueTag::U32),
            10 => Some(ValueTag::U64),
            11 => Some(ValueTag::Char16),
            12 => Some(ValueTag::F32),
            13 => Some(ValueTag::F64),
            14 => Some(ValueTag::Decimal),
            15 => Some(ValueTag::StringInline),
            16 => Some(ValueTag::StringRef),
            17 => Some(ValueTag::Guid16),
            18 => Some(ValueTag::DateTimeBin64),
            19 => Some(ValueTag::TimeSpanTicks),
            20 => Some(ValueTag::DateTimeOffset),
            21 => Some(ValueTag::Enum),
            22 => Some(ValueTag::ByteArray),
            23 => Some(ValueTag::Array),
            24 => Some(ValueTag::List),
            25 => Some(ValueTag::Dictionary),
            _ => None,
        }
    }
}

/// Type-spec kind: the first byte of every encoded type-spec.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpecKind {
    /// A built-in value type, followed by its known-type code
    PrimitiveOrKnown = 0,
    /// An enum type, followed by an enum-type reference
    Enum = 1,
    /// Any other (user-object) type, no payload
    Object = 2,
}

impl TypeSpecKind {
    /// Convert a wire byte back to a kind.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TypeSpecKind::PrimitiveOrKnown),
            1 => Some(TypeSpecKind::Enum),
            2 => Some(TypeSpecKind::Object),
            _ => None,
        }
    }
}

/// Enum-type reference marker: table entry follows as a varint id.
pub const ENUM_REF_TABLE: u8 = 0;

/// Enum-type reference marker: inline descriptor follows.
pub const ENUM_REF_INLINE: u8 = 1;

/// Enum-type reference marker: name-only descriptor follows (identity
/// fields omitted by the encoder).
pub const ENUM_REF_NAME_ONLY: u8 = 2;
