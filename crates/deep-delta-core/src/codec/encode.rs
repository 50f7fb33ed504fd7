//! Wire-format encoding.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::tables::{build_tables, EnumTypeTable, StringTable};
use crate::codec::tags::{TypeSpecKind, ValueTag, ENUM_REF_INLINE, ENUM_REF_NAME_ONLY, ENUM_REF_TABLE};
use crate::codec::varint::{write_varint, write_varuint};
use crate::codec::CodecOptions;
use crate::constants::{CODEC_MAGIC, CODEC_VERSION, FLAG_ENUM_TABLE, FLAG_STRING_TABLE};
use crate::types::delta::{DeltaDocument, DeltaKind, DeltaOp};
use crate::types::error::{CapacityError, EncodeError, Result};
use crate::types::value::{EnumTypeId, EnumUnderlying, TypeSpec, Value};

/// Encode a document to wire bytes under the given options.
///
/// Headerful frames open with magic, version, fingerprint and a flags
/// byte, followed by the optional tables. Headerless frames carry just
/// the op count and ops. Safety caps are enforced during encoding.
pub fn encode(doc: &DeltaDocument, options: &CodecOptions) -> Result<Bytes> {
    let total_ops = doc.deep_len();
    if total_ops > options.max_ops {
        return Err(CapacityError::OpsExceeded {
            limit: options.max_ops,
            observed: total_ops,
        }
        .into());
    }

    let (strings, enums) = if options.include_header {
        build_tables(doc, options.use_string_table, options.use_enum_type_table)
    } else {
        (None, None)
    };

    let mut encoder = Encoder {
        buf: BytesMut::with_capacity(64 + total_ops * 8),
        options,
        strings,
        enums,
        string_bytes: 0,
        depth: 0,
    };

    if options.include_header {
        encoder.write_header()?;
    }
    encoder.write_document(doc)?;
    Ok(encoder.buf.freeze())
}

struct Encoder<'o> {
    buf: BytesMut,
    options: &'o CodecOptions,
    strings: Option<StringTable>,
    enums: Option<EnumTypeTable>,
    string_bytes: usize,
    depth: usize,
}

impl Encoder<'_> {
    fn write_header(&mut self) -> Result<()> {
        self.buf.put_slice(&CODEC_MAGIC);
        write_varuint(&mut self.buf, u64::from(CODEC_VERSION));
        write_varuint(&mut self.buf, self.options.stable_type_fingerprint);

        let mut flags = 0u8;
        if self.strings.is_some() {
            flags |= FLAG_STRING_TABLE;
        }
        if self.enums.is_some() {
            flags |= FLAG_ENUM_TABLE;
        }
        self.buf.put_u8(flags);

        if let Some(strings) = self.strings.take() {
            write_varuint(&mut self.buf, strings.entries().len() as u64);
            for entry in strings.entries() {
                self.count_string_bytes(entry.len())?;
                write_varuint(&mut self.buf, entry.len() as u64);
                self.buf.put_slice(entry.as_bytes());
            }
            self.strings = Some(strings);
        }
        if let Some(enums) = self.enums.take() {
            write_varuint(&mut self.buf, enums.entries().len() as u64);
            for entry in enums.entries() {
                self.write_raw_str(&entry.full_name)?;
                self.write_raw_str(&entry.module)?;
                self.buf.put_slice(entry.module_version.as_bytes());
            }
            self.enums = Some(enums);
        }
        Ok(())
    }

    fn count_string_bytes(&mut self, len: usize) -> Result<()> {
        if len > self.options.max_string_bytes {
            return Err(CapacityError::StringBytesExceeded {
                limit: self.options.max_string_bytes,
                observed: len,
            }
            .into());
        }
        self.string_bytes += len;
        if self.string_bytes > self.options.max_string_bytes {
            return Err(CapacityError::StringBytesExceeded {
                limit: self.options.max_string_bytes,
                observed: self.string_bytes,
            }
            .into());
        }
        Ok(())
    }

    fn write_raw_str(&mut self, value: &str) -> Result<()> {
        self.count_string_bytes(value.len())?;
        write_varuint(&mut self.buf, value.len() as u64);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_nesting {
            return Err(CapacityError::NestingExceeded {
                limit: self.options.max_nesting,
                observed: self.depth,
            }
            .into());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn write_document(&mut self, doc: &DeltaDocument) -> Result<()> {
        write_varuint(&mut self.buf, doc.len() as u64);
        for op in doc.iter() {
            self.write_op(op)?;
        }
        Ok(())
    }

    fn write_op(&mut self, op: &DeltaOp) -> Result<()> {
        write_varuint(&mut self.buf, u64::from(op.kind as u8));
        write_varint(&mut self.buf, i64::from(op.member_index));

        if op.kind.is_sequence() {
            write_varuint(&mut self.buf, op.index.max(0) as u64);
        }
        if op.kind.is_map() {
            let key = op.key.clone().unwrap_or(Value::Null);
            self.write_value(&key)?;
        }
        match op.kind {
            DeltaKind::ReplaceObject
            | DeltaKind::SetMember
            | DeltaKind::SeqReplaceAt
            | DeltaKind::SeqAddAt
            | DeltaKind::SeqRemoveAt
            | DeltaKind::DictSet => {
                let value = op.value.clone().unwrap_or(Value::Null);
                self.write_value(&value)?;
            }
            _ => {}
        }
        match op.kind {
            DeltaKind::NestedMember | DeltaKind::SeqNestedAt | DeltaKind::DictNested => {
                self.enter()?;
                match op.nested.as_ref() {
                    Some(nested) => self.write_document(nested)?,
                    None => write_varuint(&mut self.buf, 0),
                }
                self.leave();
            }
            _ => {}
        }
        Ok(())
    }

    fn write_str_value(&mut self, value: &str) -> Result<()> {
        if let Some(id) = self.strings.as_ref().and_then(|t| t.lookup(value)) {
            self.buf.put_u8(ValueTag::StringRef as u8);
            write_varuint(&mut self.buf, u64::from(id));
            return Ok(());
        }
        self.buf.put_u8(ValueTag::StringInline as u8);
        self.write_raw_str(value)
    }

    fn write_enum_ref(&mut self, ty: &EnumTypeId) -> Result<()> {
        if let Some(id) = self.enums.as_ref().and_then(|t| t.lookup(ty)) {
            self.buf.put_u8(ENUM_REF_TABLE);
            write_varuint(&mut self.buf, u64::from(id));
            return Ok(());
        }
        if self.options.include_enum_type_identity {
            self.buf.put_u8(ENUM_REF_INLINE);
            self.write_str_value(&ty.full_name)?;
            self.write_str_value(&ty.module)?;
            self.buf.put_slice(ty.module_version.as_bytes());
        } else {
            self.buf.put_u8(ENUM_REF_NAME_ONLY);
            self.write_str_value(&ty.full_name)?;
        }
        Ok(())
    }

    fn write_type_spec(&mut self, spec: &TypeSpec) -> Result<()> {
        match spec {
            TypeSpec::Known(code) => {
                self.buf.put_u8(TypeSpecKind::PrimitiveOrKnown as u8);
                self.buf.put_u8(*code as u8);
            }
            TypeSpec::Enum(ty) => {
                self.buf.put_u8(TypeSpecKind::Enum as u8);
                self.write_enum_ref(ty)?;
            }
            TypeSpec::Object => {
                self.buf.put_u8(TypeSpecKind::Object as u8);
            }
        }
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.buf.put_u8(ValueTag::Null as u8),
            Value::Bool(false) => self.buf.put_u8(ValueTag::BoolFalse as u8),
            Value::Bool(true) => self.buf.put_u8(ValueTag::BoolTrue as u8),
            Value::I8(v) => {
                self.buf.put_u8(ValueTag::I8 as u8);
                write_varint(&mut self.buf, i64::from(*v));
            }
            Value::I16(v) => {
                self.buf.put_u8(ValueTag::I16 as u8);
                write_varint(&mut self.buf, i64::from(*v));
            }
            Value::I32(v) => {
                self.buf.put_u8(ValueTag::I32 as u8);
                write_varint(&mut self.buf, i64::from(*v));
            }
            Value::I64(v) => {
                self.buf.put_u8(ValueTag::I64 as u8);
                write_varint(&mut self.buf, *v);
            }
            Value::U8(v) => {
                self.buf.put_u8(ValueTag::U8 as u8);
                write_varuint(&mut self.buf, u64::from(*v));
            }
            Value::U16(v) => {
                self.buf.put_u8(ValueTag::U16 as u8);
                write_varuint(&mut self.buf, u64::from(*v));
            }
            Value::U32(v) => {
                self.buf.put_u8(ValueTag::U32 as u8);
                write_varuint(&mut self.buf, u64::from(*v));
            }
            Value::U64(v) => {
                self.buf.put_u8(ValueTag::U64 as u8);
                write_varuint(&mut self.buf, *v);
            }
            Value::Char(v) => {
                self.buf.put_u8(ValueTag::Char16 as u8);
                self.buf.put_u16_le(*v);
            }
            Value::F32(v) => {
                self.buf.put_u8(ValueTag::F32 as u8);
                self.buf.put_u32_le(v.to_bits());
            }
            Value::F64(v) => {
                self.buf.put_u8(ValueTag::F64 as u8);
                self.buf.put_u64_le(v.to_bits());
            }
            Value::Decimal(v) => {
                self.buf.put_u8(ValueTag::Decimal as u8);
                let magnitude = v.mantissa().unsigned_abs();
                self.buf.put_u32_le(magnitude as u32);
                self.buf.put_u32_le((magnitude >> 32) as u32);
                self.buf.put_u32_le((magnitude >> 64) as u32);
                let mut flags = v.scale() << 16;
                if v.is_sign_negative() {
                    flags |= 0x8000_0000;
                }
                self.buf.put_u32_le(flags);
            }
            Value::Str(s) => self.write_str_value(s)?,
            Value::Guid(guid) => {
                self.buf.put_u8(ValueTag::Guid16 as u8);
                self.buf.put_slice(guid.as_bytes());
            }
            Value::DateTime(dt) => {
                self.buf.put_u8(ValueTag::DateTimeBin64 as u8);
                self.buf.put_i64_le(dt.to_binary());
            }
            Value::TimeSpan(ts) => {
                self.buf.put_u8(ValueTag::TimeSpanTicks as u8);
                write_varint(&mut self.buf, ts.ticks);
            }
            Value::DateTimeOffset(dto) => {
                self.buf.put_u8(ValueTag::DateTimeOffset as u8);
                write_varint(&mut self.buf, dto.local_ticks);
                write_varint(&mut self.buf, i64::from(dto.offset_minutes));
            }
            Value::Enum(e) => {
                self.buf.put_u8(ValueTag::Enum as u8);
                self.write_enum_ref(&e.ty)?;
                self.buf.put_u8(e.value.code());
                match e.value {
                    EnumUnderlying::I8(v) => write_varint(&mut self.buf, i64::from(v)),
                    EnumUnderlying::I16(v) => write_varint(&mut self.buf, i64::from(v)),
                    EnumUnderlying::I32(v) => write_varint(&mut self.buf, i64::from(v)),
                    EnumUnderlying::I64(v) => write_varint(&mut self.buf, v),
                    EnumUnderlying::U8(v) => write_varuint(&mut self.buf, u64::from(v)),
                    EnumUnderlying::U16(v) => write_varuint(&mut self.buf, u64::from(v)),
                    EnumUnderlying::U32(v) => write_varuint(&mut self.buf, u64::from(v)),
                    EnumUnderlying::U64(v) => write_varuint(&mut self.buf, v),
                }
            }
            Value::Bytes(bytes) => {
                self.buf.put_u8(ValueTag::ByteArray as u8);
                self.count_string_bytes(bytes.len())?;
                write_varuint(&mut self.buf, bytes.len() as u64);
                self.buf.put_slice(bytes);
            }
            Value::List(list) => {
                self.buf.put_u8(ValueTag::List as u8);
                self.write_type_spec(&list.elem)?;
                write_varuint(&mut self.buf, list.items.len() as u64);
                self.enter()?;
                for item in &list.items {
                    self.write_value(item)?;
                }
                self.leave();
            }
            Value::Map(map) => {
                self.buf.put_u8(ValueTag::Dictionary as u8);
                self.write_type_spec(&map.key)?;
                self.write_type_spec(&map.value)?;
                write_varuint(&mut self.buf, map.entries.len() as u64);
                self.enter()?;
                for (k, v) in &map.entries {
                    self.write_value(k)?;
                    self.write_value(v)?;
                }
                self.leave();
            }
            Value::Object(_) => {
                return Err(EncodeError::UnsupportedValue(
                    "user objects travel only through nested scopes",
                )
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headerless_frame_opens_with_op_count() {
        // Goal: no magic in headerless mode; first byte is the count
        let mut doc = DeltaDocument::new();
        doc.push(DeltaOp::set_member(0, Value::Bool(true)));
        let bytes = encode(&doc, &CodecOptions::headerless()).unwrap();
        assert_eq!(bytes[0], 1);
        assert_ne!(&bytes[..4], &CODEC_MAGIC);
    }

    #[test]
    fn headerful_frame_opens_with_magic() {
        // Goal: magic, version and flags come first
        let doc = DeltaDocument::new();
        let bytes = encode(&doc, &CodecOptions::default()).unwrap();
        assert_eq!(&bytes[..4], &CODEC_MAGIC);
        assert_eq!(bytes[4], CODEC_VERSION as u8);
    }

    #[test]
    fn object_payloads_are_rejected() {
        // Goal: user objects cannot be serialized inline
        let mut doc = DeltaDocument::new();
        doc.push(DeltaOp::set_member(0, Value::object(String::from("pet"))));
        let err = encode(&doc, &CodecOptions::headerless()).unwrap_err();
        assert!(matches!(
            err,
            crate::types::error::Error::Encode(EncodeError::UnsupportedValue(_))
        ));
    }

    #[test]
    fn op_cap_is_enforced_on_encode() {
        // Goal: documents beyond MaxOps refuse to encode
        let mut doc = DeltaDocument::new();
        for i in 0..10 {
            doc.push(DeltaOp::set_member(i, Value::I32(i)));
        }
        let options = CodecOptions {
            max_ops: 5,
            ..CodecOptions::headerless()
        };
        let err = encode(&doc, &options).unwrap_err();
        assert!(matches!(
            err,
            crate::types::error::Error::Capacity(CapacityError::OpsExceeded { .. })
        ));
    }

    #[test]
    fn nesting_cap_is_enforced_on_encode() {
        // Goal: deeper nesting than MaxNesting refuses to encode
        let mut doc = DeltaDocument::new();
        doc.push(DeltaOp::set_member(0, Value::I32(1)));
        for _ in 0..5 {
            let mut outer = DeltaDocument::new();
            outer.push(DeltaOp::nested_member(0, doc));
            doc = outer;
        }
        let options = CodecOptions {
            max_nesting: 3,
            ..CodecOptions::headerless()
        };
        let err = encode(&doc, &options).unwrap_err();
        assert!(matches!(
            err,
            crate::types::error::Error::Capacity(CapacityError::NestingExceeded { .. })
        ));
    }
}
