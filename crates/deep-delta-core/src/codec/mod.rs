//! Binary codec for delta documents.
//!
//! A lossless, self-describing wire format with two profiles: the
//! headerful profile opens with magic, version, a stable type
//! fingerprint and optional string/enum-type tables; the headerless
//! profile carries just the op stream. All fixed-width fields are
//! little-endian; varints are unsigned LEB128 with zigzag for signed
//! values.

/// Wire-format decoding
pub mod decode;
/// Wire-format encoding
pub mod encode;
/// Header tables
pub mod tables;
/// Value and type-spec tags
pub mod tags;
/// Varint primitives
pub mod varint;

use crate::constants::{MAX_NESTING, MAX_OPS, MAX_STRING_BYTES};

pub use decode::decode;
pub use encode::encode;

/// Options selecting a codec profile and its safety caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    /// Emit the magic/version/fingerprint/flags header
    pub include_header: bool,
    /// Fingerprint of the schema the document was computed against;
    /// written to the header and surfaced on decode
    pub stable_type_fingerprint: u64,
    /// Intern repeated and long strings into a header table
    pub use_string_table: bool,
    /// Collect referenced enum types into a header table
    pub use_enum_type_table: bool,
    /// Carry full enum identity (module and version) with inline
    /// descriptors; when off, descriptors are name-only
    pub include_enum_type_identity: bool,
    /// Cap on total operations, nested documents included
    pub max_ops: usize,
    /// Cap on string payload bytes, per string and cumulative
    pub max_string_bytes: usize,
    /// Cap on nested-document and container depth
    pub max_nesting: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            stable_type_fingerprint: 0,
            use_string_table: true,
            use_enum_type_table: true,
            include_enum_type_identity: true,
            max_ops: MAX_OPS,
            max_string_bytes: MAX_STRING_BYTES,
            max_nesting: MAX_NESTING,
        }
    }
}

impl CodecOptions {
    /// The headerless profile: no magic, no tables, default caps.
    pub fn headerless() -> Self {
        Self {
            include_header: false,
            use_string_table: false,
            use_enum_type_table: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::delta::{DeltaDocument, DeltaOp};
    use crate::types::temporal::{DateTime, DateTimeKind, DateTimeOffset, TimeSpan};
    use crate::types::value::{KnownTypeCode, TypeSpec, Value, ValueList, ValueMap};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn roundtrip(doc: &DeltaDocument, options: &CodecOptions) -> DeltaDocument {
        let bytes = encode(doc, options).unwrap();
        decode(&bytes, options).unwrap()
    }

    fn scalar_fixture() -> DeltaDocument {
        let mut doc = DeltaDocument::new();
        let values = vec![
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
            Value::I8(-5),
            Value::I16(-300),
            Value::I32(70_000),
            Value::I64(-9_000_000_000),
            Value::U8(200),
            Value::U16(60_000),
            Value::U32(4_000_000_000),
            Value::U64(u64::MAX),
            Value::Char(0x263A),
            Value::F32(1.5),
            Value::F64(-2.25),
            Value::Decimal(Decimal::from_str("79228.162514264337593543").unwrap()),
            Value::from("inline"),
            Value::Guid(uuid::Uuid::from_u128(0x1234_5678_9ABC_DEF0)),
            Value::DateTime(DateTime::new(DateTimeKind::Utc, 638_000_000_000_000_000)),
            Value::TimeSpan(TimeSpan::from_seconds(-90)),
            Value::DateTimeOffset(DateTimeOffset::new(638_000_000_000_000_000, -330)),
            Value::bytes(vec![0u8, 1, 2, 255]),
        ];
        for (i, value) in values.into_iter().enumerate() {
            doc.push(DeltaOp::set_member(i as i32, value));
        }
        doc
    }

    #[test]
    fn scalar_values_roundtrip_headerless() {
        // Goal: every scalar tag survives the headerless profile
        let doc = scalar_fixture();
        assert_eq!(roundtrip(&doc, &CodecOptions::headerless()), doc);
    }

    #[test]
    fn scalar_values_roundtrip_headerful() {
        // Goal: the headerful profile is equally lossless
        let doc = scalar_fixture();
        assert_eq!(roundtrip(&doc, &CodecOptions::default()), doc);
    }

    #[test]
    fn negative_zero_and_nan_are_bit_exact() {
        // Goal: float payloads preserve bit patterns exactly
        let mut doc = DeltaDocument::new();
        doc.push(DeltaOp::set_member(0, Value::F64(-0.0)));
        doc.push(DeltaOp::set_member(1, Value::F64(f64::NAN)));
        doc.push(DeltaOp::set_member(2, Value::F32(f32::NEG_INFINITY)));
        let decoded = roundtrip(&doc, &CodecOptions::headerless());
        assert_eq!(decoded, doc);
        match decoded.as_ops()[0].value {
            Some(Value::F64(v)) => assert!(v.is_sign_negative() && v == 0.0),
            _ => panic!("expected F64"),
        }
    }

    #[test]
    fn string_table_references_resolve() {
        // Goal: interned strings decode identically to inline ones
        let mut doc = DeltaDocument::new();
        for i in 0..4 {
            doc.push(DeltaOp::set_member(i, Value::from("repeated-value")));
        }
        doc.push(DeltaOp::set_member(9, Value::from("one")));
        let headerful = roundtrip(&doc, &CodecOptions::default());
        assert_eq!(headerful, doc);

        // interning shrinks the frame relative to headerless content
        let with_table = encode(&doc, &CodecOptions::default()).unwrap();
        let without = encode(&doc, &CodecOptions::headerless()).unwrap();
        assert!(with_table.len() < without.len() + 16);
    }

    #[test]
    fn lists_and_maps_roundtrip() {
        // Goal: container payloads survive with their type-specs
        let list = Value::List(ValueList {
            elem: TypeSpec::Known(KnownTypeCode::I32),
            items: vec![Value::I32(1), Value::I32(2)],
        });
        let map = Value::Map(ValueMap {
            key: TypeSpec::Known(KnownTypeCode::String),
            value: TypeSpec::Object,
            entries: vec![(Value::from("k"), Value::Null)],
        });
        let mut doc = DeltaDocument::new();
        doc.push(DeltaOp::set_member(0, list));
        doc.push(DeltaOp::dict_set(1, Value::from("key"), map));
        assert_eq!(roundtrip(&doc, &CodecOptions::headerless()), doc);
        assert_eq!(roundtrip(&doc, &CodecOptions::default()), doc);
    }

    #[test]
    fn nested_documents_roundtrip() {
        // Goal: nested ops carry their sub-documents across the wire
        let mut inner = DeltaDocument::new();
        inner.push(DeltaOp::set_member(0, Value::from("renamed")));
        let mut middle = DeltaDocument::new();
        middle.push(DeltaOp::seq_nested_at(1, 4, inner));
        middle.push(DeltaOp::seq_remove_at(1, 7, Value::I32(3)));
        let mut doc = DeltaDocument::new();
        doc.push(DeltaOp::nested_member(2, middle));
        doc.push(DeltaOp::dict_remove(3, Value::from("old")));
        assert_eq!(roundtrip(&doc, &CodecOptions::headerless()), doc);
        assert_eq!(roundtrip(&doc, &CodecOptions::default()), doc);
    }

    #[test]
    fn enum_values_roundtrip_with_table_and_inline() {
        // Goal: enum identities resolve through both reference forms
        use crate::registry::register_enum_type;
        use crate::types::value::{EnumUnderlying, EnumValue};

        let ty = crate::types::value::EnumTypeId::new(
            "Codec.Color",
            "codec-tests",
            uuid::Uuid::from_u128(0xAB),
        );
        register_enum_type(ty.clone());
        let mut doc = DeltaDocument::new();
        doc.push(DeltaOp::set_member(
            0,
            Value::Enum(EnumValue {
                ty: ty.clone(),
                value: EnumUnderlying::I32(2),
            }),
        ));
        doc.push(DeltaOp::set_member(
            1,
            Value::Enum(EnumValue {
                ty,
                value: EnumUnderlying::U8(9),
            }),
        ));
        assert_eq!(roundtrip(&doc, &CodecOptions::default()), doc);
        assert_eq!(roundtrip(&doc, &CodecOptions::headerless()), doc);
    }

    #[test]
    fn unresolved_enum_value_is_a_decode_error() {
        // Goal: enum values must resolve; no silent object fallback
        use crate::types::value::{EnumUnderlying, EnumValue};
        let ty = crate::types::value::EnumTypeId::new(
            "Codec.Unknown",
            "codec-tests",
            uuid::Uuid::from_u128(0xDEAD),
        );
        let mut doc = DeltaDocument::new();
        doc.push(DeltaOp::set_member(
            0,
            Value::Enum(EnumValue {
                ty,
                value: EnumUnderlying::I32(1),
            }),
        ));
        let bytes = encode(&doc, &CodecOptions::headerless()).unwrap();
        let err = decode(&bytes, &CodecOptions::headerless()).unwrap_err();
        assert!(matches!(
            err,
            crate::types::error::Error::Decode(
                crate::types::error::DecodeError::UnresolvedEnumType { .. }
            )
        ));
    }
}
