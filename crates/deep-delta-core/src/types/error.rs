//! Error types and handling for the delta engine.
//!
//! This module defines all error types used throughout the system,
//! organized by failure family: contract violations, codec decode
//! failures, capacity-cap overruns and registry resolution misses.

use thiserror::Error;

/// Main result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the delta engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Contract violations caused by misuse of the API
    #[error("Contract violation: {0}")]
    Contract(#[from] ContractError),

    /// Failures while decoding a wire-format document
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Failures while encoding a document to the wire format
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Safety-cap overruns on encode or decode
    #[error("Capacity exceeded: {0}")]
    Capacity(#[from] CapacityError),

    /// Helper-registry resolution failures
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Contract violations: programming bugs in the caller, surfaced
/// synchronously so the current compute/apply/codec call aborts.
#[derive(Error, Debug)]
pub enum ContractError {
    /// A `SeqRemoveAt` operation carried no expected element
    #[error("SeqRemoveAt at index {index} carries no expected element")]
    MissingExpectedElement {
        /// Sequence index targeted by the operation
        index: i32,
    },

    /// A nested scope was closed out of LIFO order
    #[error("nested scope closed out of order")]
    ScopeOrder,

    /// A writer was used after its document had been transferred
    #[error("writer reused after its document was taken")]
    WriterConsumed,
}

/// Decode errors: malformed or unsupported wire input. The target of a
/// pending apply is left untouched when any of these is raised.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Frame did not open with the expected magic bytes
    #[error("bad magic bytes")]
    BadMagic,

    /// Frame version is not supported by this build
    #[error("unsupported wire version {0}")]
    UnsupportedVersion(u32),

    /// A value carried a tag outside the known set
    #[error("unknown value tag 0x{0:02X} at offset {1}")]
    UnknownValueTag(u8, usize),

    /// An operation carried a kind outside the known set
    #[error("unknown operation kind 0x{0:02X} at offset {1}")]
    UnknownOpKind(u8, usize),

    /// A type-spec carried a kind outside the known set
    #[error("unknown type-spec kind 0x{0:02X}")]
    UnknownTypeSpec(u8),

    /// An enum value carried an unknown underlying-type code
    #[error("unknown enum underlying type 0x{0:02X}")]
    UnknownEnumUnderlying(u8),

    /// An enum value referenced a type that is not registered
    #[error("unresolved enum type: {name}")]
    UnresolvedEnumType {
        /// Full name carried by the wire descriptor
        name: String,
    },

    /// A string-table reference pointed past the end of the table
    #[error("string table reference {0} out of range")]
    BadStringRef(usize),

    /// An enum-table reference pointed past the end of the table
    #[error("enum table reference {0} out of range")]
    BadEnumRef(usize),

    /// A string payload was not valid UTF-8
    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,

    /// Input ended before the structure was complete
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof {
        /// Byte offset at which input was exhausted
        offset: usize,
    },

    /// A varint ran past its maximum encoded width
    #[error("malformed varint at offset {offset}")]
    MalformedVarint {
        /// Byte offset of the first varint byte
        offset: usize,
    },
}

/// Encode errors: documents that cannot be represented on the wire.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// A payload value lies outside the fixed wire value universe
    #[error("value not representable on the wire: {0}")]
    UnsupportedValue(&'static str),
}

/// Capacity errors: safety caps exceeded on encode or decode.
#[derive(Error, Debug)]
pub enum CapacityError {
    /// Total operation count exceeded the cap
    #[error("operation count {observed} exceeds cap {limit}")]
    OpsExceeded {
        /// Configured cap
        limit: usize,
        /// Count observed when the cap tripped
        observed: usize,
    },

    /// String payload bytes exceeded the cap
    #[error("string bytes {observed} exceed cap {limit}")]
    StringBytesExceeded {
        /// Configured cap
        limit: usize,
        /// Byte count observed when the cap tripped
        observed: usize,
    },

    /// Nested-document depth exceeded the cap
    #[error("nesting depth {observed} exceeds cap {limit}")]
    NestingExceeded {
        /// Configured cap
        limit: usize,
        /// Depth observed when the cap tripped
        observed: usize,
    },
}

/// Registry errors: a required same-type helper could not be resolved.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No helper is registered for the named type
    #[error("no registered helper for type {type_name}")]
    MissingHelper {
        /// `std::any::type_name` of the missing type
        type_name: &'static str,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error aborts a decode (the apply target is untouched)
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::Capacity(_))
    }

    /// Check if this error indicates caller misuse rather than bad input
    pub fn is_contract_error(&self) -> bool {
        matches!(self, Error::Contract(_))
    }
}
