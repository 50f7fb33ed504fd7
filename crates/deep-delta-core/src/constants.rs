//! Global constants shared across the delta engine.
//!
//! This module contains compile-time constants that are shared across
//! multiple modules to ensure consistency and avoid magic numbers.

/// Magic bytes opening a headerful delta frame (`BDC1`).
pub const CODEC_MAGIC: [u8; 4] = *b"BDC1";

/// Wire-format version written and accepted by the codec.
pub const CODEC_VERSION: u32 = 1;

/// Flags-byte bit marking a string table as present in the header.
pub const FLAG_STRING_TABLE: u8 = 0b0000_0001;

/// Flags-byte bit marking an enum-type table as present in the header.
pub const FLAG_ENUM_TABLE: u8 = 0b0000_0010;

/// Flags-byte bits that must be zero on write and are ignored on read.
pub const FLAG_RESERVED_MASK: u8 = 0b1111_1100;

/// Maximum number of operations accepted in a single document,
/// counting operations inside nested documents.
///
/// Bounds decode-side work for hostile input. Checked on both
/// encode and decode.
pub const MAX_OPS: usize = 1_000_000;

/// Maximum total string payload in bytes accepted during decode (16MB).
///
/// Applies to each individual string and to the running total across
/// a document, including table entries.
pub const MAX_STRING_BYTES: usize = 16 * 1024 * 1024;

/// Maximum nesting depth for sub-documents.
///
/// Tracked on both write and read; exceeding it aborts with a
/// capacity error rather than recursing further.
pub const MAX_NESTING: usize = 256;

/// Minimum occurrence count for a string to be interned in the
/// header string table.
pub const STRING_INTERN_MIN_COUNT: usize = 2;

/// Minimum length in bytes for a string to be interned regardless
/// of occurrence count.
pub const STRING_INTERN_MIN_LEN: usize = 8;

/// Number of pooled documents retained per thread.
///
/// Rent/return traffic beyond this falls back to plain allocation.
pub const DOCUMENT_POOL_CAPACITY: usize = 32;

/// Member index used by document-level operations (`ReplaceObject`).
pub const DOCUMENT_MEMBER_INDEX: i32 = -1;

/// Sequence index used by operations that do not address a sequence slot.
pub const NO_INDEX: i32 = -1;
