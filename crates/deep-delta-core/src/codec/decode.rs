//! Wire-format decoding with safety caps.
//!
//! Every counted length is validated before allocation. Unknown value
//! tags and op kinds are decode errors; unknown enum identities are
//! errors for values and degrade to the object spec for type-specs.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::codec::tables::EnumTypeTable;
use crate::codec::tags::{TypeSpecKind, ValueTag, ENUM_REF_INLINE, ENUM_REF_NAME_ONLY, ENUM_REF_TABLE};
use crate::codec::varint::{zigzag_decode, MAX_VARINT_LEN};
use crate::codec::CodecOptions;
use crate::constants::{CODEC_MAGIC, CODEC_VERSION, FLAG_ENUM_TABLE, FLAG_STRING_TABLE};
use crate::registry;
use crate::types::delta::{DeltaDocument, DeltaKind, DeltaOp};
use crate::types::error::{CapacityError, DecodeError, Error, Result};
use crate::types::temporal::{DateTime, DateTimeOffset, TimeSpan};
use crate::types::value::{
    EnumTypeId, EnumUnderlying, EnumValue, KnownTypeCode, TypeSpec, Value, ValueList, ValueMap,
};

/// Decode wire bytes into a document under the given options.
///
/// Any error leaves no partial result: the caller never observes a
/// half-built document, so a pending apply target stays untouched.
pub fn decode(bytes: &[u8], options: &CodecOptions) -> Result<DeltaDocument> {
    let mut decoder = Decoder {
        bytes,
        pos: 0,
        options,
        strings: Vec::new(),
        enums: EnumTypeTable::default(),
        string_bytes: 0,
        total_ops: 0,
        depth: 0,
    };
    if options.include_header {
        decoder.read_header()?;
    }
    decoder.read_document()
}

struct Decoder<'a, 'o> {
    bytes: &'a [u8],
    pos: usize,
    options: &'o CodecOptions,
    strings: Vec<Arc<str>>,
    enums: EnumTypeTable,
    string_bytes: usize,
    total_ops: usize,
    depth: usize,
}

impl Decoder<'_, '_> {
    fn eof(&self) -> Error {
        DecodeError::UnexpectedEof { offset: self.pos }.into()
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.bytes.get(self.pos).ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, len: usize) -> Result<&[u8]> {
        if self.pos + len > self.bytes.len() {
            return Err(self.eof());
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        let raw = self.read_slice(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let raw = self.read_slice(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_u64_le(&mut self) -> Result<u64> {
        let raw = self.read_slice(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(raw);
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_varuint(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if self.pos - start >= MAX_VARINT_LEN {
                return Err(DecodeError::MalformedVarint { offset: start }.into());
            }
        }
    }

    fn read_varint(&mut self) -> Result<i64> {
        Ok(zigzag_decode(self.read_varuint()?))
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

    fn read_raw_str(&mut self) -> Result<Arc<str>> {
        let len = self.read_varuint()? as usize;
        self.count_string_bytes(len)?;
        let raw = self.read_slice(len)?;
        let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok(Arc::from(text))
    }

    fn read_header(&mut self) -> Result<()> {
        let magic = self.read_slice(CODEC_MAGIC.len())?;
        if magic != CODEC_MAGIC {
            return Err(DecodeError::BadMagic.into());
        }
        let version = self.read_varuint()? as u32;
        if version != CODEC_VERSION {
            return Err(DecodeError::UnsupportedVersion(version).into());
        }
        let fingerprint = self.read_varuint()?;
        tracing::trace!(fingerprint, "decoded frame fingerprint");

        // reserved flag bits are ignored on read
        let flags = self.read_u8()?;
        if flags & FLAG_STRING_TABLE != 0 {
            let count = self.read_varuint()? as usize;
            if count > self.options.max_ops {
                return Err(CapacityError::OpsExceeded {
                    limit: self.options.max_ops,
                    observed: count,
                }
                .into());
            }
            self.strings.reserve(count);
            for _ in 0..count {
                let entry = self.read_raw_str()?;
                self.strings.push(entry);
            }
        }
        if flags & FLAG_ENUM_TABLE != 0 {
            let count = self.read_varuint()? as usize;
            if count > self.options.max_ops {
                return Err(CapacityError::OpsExceeded {
                    limit: self.options.max_ops,
                    observed: count,
                }
                .into());
            }
            for _ in 0..count {
                let full_name = self.read_raw_str()?;
                let module = self.read_raw_str()?;
                let raw = self.read_slice(16)?;
                let mut mvid = [0u8; 16];
                mvid.copy_from_slice(raw);
                self.enums
                    .push(EnumTypeId::new(full_name, module, Uuid::from_bytes(mvid)));
            }
        }
        Ok(())
    }

    fn bump_ops(&mut self, count: usize) -> Result<()> {
        self.total_ops += count;
        if self.total_ops > self.options.max_ops {
            return Err(CapacityError::OpsExceeded {
                limit: self.options.max_ops,
                observed: self.total_ops,
            }
            .into());
        }
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

    fn read_document(&mut self) -> Result<DeltaDocument> {
        let count = self.read_varuint()? as usize;
        self.bump_ops(count)?;
        let mut doc = DeltaDocument::with_capacity(count);
        for _ in 0..count {
            doc.push(self.read_op()?);
        }
        Ok(doc)
    }

    fn read_op(&mut self) -> Result<DeltaOp> {
        let offset = self.pos;
        let raw_kind = self.read_varuint()?;
        let kind = u8::try_from(raw_kind)
            .ok()
            .and_then(DeltaKind::from_u8)
            .ok_or(DecodeError::UnknownOpKind((raw_kind & 0xFF) as u8, offset))?;
        let member_index = self.read_varint()? as i32;

        let index = if kind.is_sequence() {
            self.read_varuint()? as i32
        } else {
            -1
        };
        let key = if kind.is_map() {
            Some(self.read_value()?)
        } else {
            None
        };
        let value = match kind {
            DeltaKind::ReplaceObject
            | DeltaKind::SetMember
            | DeltaKind::SeqReplaceAt
            | DeltaKind::SeqAddAt
            | DeltaKind::SeqRemoveAt
            | DeltaKind::DictSet => Some(self.read_value()?),
            _ => None,
        };
        let nested = match kind {
            DeltaKind::NestedMember | DeltaKind::SeqNestedAt | DeltaKind::DictNested => {
                self.enter()?;
                let doc = self.read_document()?;
                self.leave();
                Some(doc)
            }
            _ => None,
        };

        Ok(DeltaOp {
            member_index,
            kind,
            index,
            key,
            value,
            nested,
        })
    }

    fn read_str_value(&mut self) -> Result<Arc<str>> {
        let offset = self.pos;
        let tag_byte = self.read_u8()?;
        match ValueTag::from_u8(tag_byte) {
            Some(ValueTag::StringInline) => self.read_raw_str(),
            Some(ValueTag::StringRef) => {
                let id = self.read_varuint()? as usize;
                self.strings
                    .get(id)
                    .cloned()
                    .ok_or_else(|| DecodeError::BadStringRef(id).into())
            }
            _ => Err(DecodeError::UnknownValueTag(tag_byte, offset).into()),
        }
    }

    fn read_enum_type(&mut self) -> Result<EnumTypeId> {
        let marker = self.read_u8()?;
        match marker {
            ENUM_REF_TABLE => {
                let id = self.read_varuint()? as usize;
                self.enums
                    .get(id)
                    .cloned()
                    .ok_or_else(|| DecodeError::BadEnumRef(id).into())
            }
            ENUM_REF_INLINE => {
                let full_name = self.read_str_value()?;
                let module = self.read_str_value()?;
                let raw = self.read_slice(16)?;
                let mut mvid = [0u8; 16];
                mvid.copy_from_slice(raw);
                Ok(EnumTypeId::new(full_name, module, Uuid::from_bytes(mvid)))
            }
            ENUM_REF_NAME_ONLY => {
                let full_name = self.read_str_value()?;
                Ok(EnumTypeId::new(full_name, "", Uuid::nil()))
            }
            other => Err(DecodeError::UnknownTypeSpec(other).into()),
        }
    }

    fn read_type_spec(&mut self) -> Result<TypeSpec> {
        let kind_byte = self.read_u8()?;
        match TypeSpecKind::from_u8(kind_byte) {
            Some(TypeSpecKind::PrimitiveOrKnown) => {
                let code_byte = self.read_u8()?;
                let code = KnownTypeCode::from_u8(code_byte)
                    .ok_or(DecodeError::UnknownTypeSpec(code_byte))?;
                Ok(TypeSpec::Known(code))
            }
            Some(TypeSpecKind::Enum) => {
                let ty = self.read_enum_type()?;
                if registry::is_enum_type_registered(&ty) {
                    Ok(TypeSpec::Enum(ty))
                } else {
                    // unresolved enum types degrade to the object spec
                    tracing::debug!(name = %ty.full_name, "unresolved enum type-spec");
                    Ok(TypeSpec::Object)
                }
            }
            Some(TypeSpecKind::Object) => Ok(TypeSpec::Object),
            None => Err(DecodeError::UnknownTypeSpec(kind_byte).into()),
        }
    }

    fn read_value(&mut self) -> Result<Value> {
        let offset = self.pos;
        let tag_byte = self.read_u8()?;
        let tag =
            ValueTag::from_u8(tag_byte).ok_or(DecodeError::UnknownValueTag(tag_byte, offset))?;
        let value = match tag {
            ValueTag::Null => Value::Null,
            ValueTag::BoolFalse => Value::Bool(false),
            ValueTag::BoolTrue => Value::Bool(true),
            ValueTag::I8 => Value::I8(self.read_varint()? as i8),
            ValueTag::I16 => Value::I16(self.read_varint()? as i16),
            ValueTag::I32 => Value::I32(self.read_varint()? as i32),
            ValueTag::I64 => Value::I64(self.read_varint()?),
            ValueTag::U8 => Value::U8(self.read_varuint()? as u8),
            ValueTag::U16 => Value::U16(self.read_varuint()? as u16),
            ValueTag::U32 => Value::U32(self.read_varuint()? as u32),
            ValueTag::U64 => Value::U64(self.read_varuint()?),
            ValueTag::Char16 => Value::Char(self.read_u16_le()?),
            ValueTag::F32 => Value::F32(f32::from_bits(self.read_u32_le()?)),
            ValueTag::F64 => Value::F64(f64::from_bits(self.read_u64_le()?)),
            ValueTag::Decimal => {
                let lo = self.read_u32_le()?;
                let mid = self.read_u32_le()?;
                let hi = self.read_u32_le()?;
                let flags = self.read_u32_le()?;
                let negative = flags & 0x8000_0000 != 0;
                let scale = (flags >> 16) & 0xFF;
                Value::Decimal(Decimal::from_parts(lo, mid, hi, negative, scale))
            }
            ValueTag::StringInline => Value::Str(self.read_raw_str()?),
            ValueTag::StringRef => {
                let id = self.read_varuint()? as usize;
                let text = self
                    .strings
                    .get(id)
                    .cloned()
                    .ok_or(DecodeError::BadStringRef(id))?;
                Value::Str(text)
            }
            ValueTag::Guid16 => {
                let raw = self.read_slice(16)?;
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(raw);
                Value::Guid(Uuid::from_bytes(bytes))
            }
            ValueTag::DateTimeBin64 => {
                let raw = self.read_u64_le()? as i64;
                Value::DateTime(DateTime::from_binary(raw))
            }
            ValueTag::TimeSpanTicks => Value::TimeSpan(TimeSpan::from_ticks(self.read_varint()?)),
            ValueTag::DateTimeOffset => {
                let ticks = self.read_varint()?;
                let offset_minutes = self.read_varint()? as i16;
                Value::DateTimeOffset(DateTimeOffset::new(ticks, offset_minutes))
            }
            ValueTag::Enum => {
                let ty = self.read_enum_type()?;
                // enum values must resolve; type-specs may degrade, values may not
                if !registry::is_enum_type_registered(&ty) {
                    return Err(DecodeError::UnresolvedEnumType {
                        name: ty.full_name.to_string(),
                    }
                    .into());
                }
                let code = self.read_u8()?;
                let underlying = match code {
                    0 => EnumUnderlying::I8(self.read_varint()? as i8),
                    1 => EnumUnderlying::I16(self.read_varint()? as i16),
                    2 => EnumUnderlying::I32(self.read_varint()? as i32),
                    3 => EnumUnderlying::I64(self.read_varint()?),
                    4 => EnumUnderlying::U8(self.read_varuint()? as u8),
                    5 => EnumUnderlying::U16(self.read_varuint()? as u16),
                    6 => EnumUnderlying::U32(self.read_varuint()? as u32),
                    7 => EnumUnderlying::U64(self.read_varuint()?),
                    other => return Err(DecodeError::UnknownEnumUnderlying(other).into()),
                };
                Value::Enum(EnumValue {
                    ty,
                    value: underlying,
                })
            }
            ValueTag::ByteArray => {
                let len = self.read_varuint()? as usize;
                self.count_string_bytes(len)?;
                let raw = self.read_slice(len)?;
                Value::Bytes(Arc::from(raw))
            }
            ValueTag::Array | ValueTag::List => {
                let elem = self.read_type_spec()?;
                let len = self.read_varuint()? as usize;
                self.bump_ops(len)?;
                self.enter()?;
                let mut items = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    items.push(self.read_value()?);
                }
                self.leave();
                Value::List(ValueList { elem, items })
            }
            ValueTag::Dictionary => {
                let key = self.read_type_spec()?;
                let value_spec = self.read_type_spec()?;
                let len = self.read_varuint()? as usize;
                self.bump_ops(len)?;
                self.enter()?;
                let mut entries = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    let k = self.read_value()?;
                    let v = self.read_value()?;
                    entries.push((k, v));
                }
                self.leave();
                Value::Map(ValueMap {
                    key,
                    value: value_spec,
                    entries,
                })
            }
        };
        Ok(value)
    }
}
