//! Field-Entry block format.
//!
//! A block is the concatenation of one entry per field, in field-map order.
//! There is no header and no trailer.
//!
//! # Entry Layout
//!
//! ```text
//! ┌──────────────────────┬──────────────────┬──────────────┬───────────────────┐
//! │ Name Length (u32 BE) │ Name (UTF-8)     │ Type Tag (1) │ Payload (by tag)  │
//! └──────────────────────┴──────────────────┴──────────────┴───────────────────┘
//! ```
//!
//! # Payloads
//!
//! ```text
//! 0x00 Null     (none)
//! 0x01 Text     [len: u32 BE][UTF-8 bytes]
//! 0x02 Int32    [i32 BE]
//! 0x03 Int64    [i64 BE]
//! 0x04 Float32  [f32 BE, IEEE-754]
//! 0x05 Float64  [f64 BE, IEEE-754]
//! 0x06 Bool     [u8: 1 = true, 0 = false]
//! 0x07 Bytes    [len: u32 BE][raw bytes]
//! 0x10 Opaque   [len: u32 BE][serializer blob]
//! ```
//!
//! A name length of zero ends the block: the decoder stops there and
//! ignores whatever follows.
//!
//! This layout is persisted by record stores and is frozen. Tags are never
//! reused; a layout change means a new codec id with an explicit migration.

use rowpack_core::Value;

/// Identifier of this block format
pub const CODEC_ID: &str = "field-entry-v1";

/// Major version of this block format
pub const CODEC_VERSION: u8 = 1;

/// Size of every length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest name or payload length the format can carry.
///
/// Lengths are written as unsigned 32-bit values but legacy readers treat
/// them as signed, so anything above `i32::MAX` is rejected both ways.
pub const MAX_LENGTH: usize = i32::MAX as usize;

/// Encoded boolean `true`
pub const BOOL_TRUE: u8 = 1;

/// Encoded boolean `false`
pub const BOOL_FALSE: u8 = 0;

/// One-byte type discriminator written after each field name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    /// No payload
    Null = 0x00,
    /// Length-prefixed UTF-8
    Text = 0x01,
    /// 4-byte big-endian integer
    Int32 = 0x02,
    /// 8-byte big-endian integer
    Int64 = 0x03,
    /// 4-byte big-endian IEEE-754
    Float32 = 0x04,
    /// 8-byte big-endian IEEE-754
    Float64 = 0x05,
    /// Single byte, 1 or 0
    Bool = 0x06,
    /// Length-prefixed raw bytes
    Bytes = 0x07,
    /// Length-prefixed opaque serializer blob
    Opaque = 0x10,
}

impl TypeTag {
    /// All tags, in tag order
    pub const ALL: [TypeTag; 9] = [
        TypeTag::Null,
        TypeTag::Text,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::Float32,
        TypeTag::Float64,
        TypeTag::Bool,
        TypeTag::Bytes,
        TypeTag::Opaque,
    ];

    /// Wire byte for this tag
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Parse a wire byte, `None` for unknown tags
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(TypeTag::Null),
            0x01 => Some(TypeTag::Text),
            0x02 => Some(TypeTag::Int32),
            0x03 => Some(TypeTag::Int64),
            0x04 => Some(TypeTag::Float32),
            0x05 => Some(TypeTag::Float64),
            0x06 => Some(TypeTag::Bool),
            0x07 => Some(TypeTag::Bytes),
            0x10 => Some(TypeTag::Opaque),
            _ => None,
        }
    }

    /// Tag for a value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => TypeTag::Null,
            Value::Text(_) => TypeTag::Text,
            Value::Int32(_) => TypeTag::Int32,
            Value::Int64(_) => TypeTag::Int64,
            Value::Float32(_) => TypeTag::Float32,
            Value::Float64(_) => TypeTag::Float64,
            Value::Bool(_) => TypeTag::Bool,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::Opaque(_) => TypeTag::Opaque,
        }
    }

    /// Payload width for fixed-width tags, `None` for length-prefixed ones
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            TypeTag::Null => Some(0),
            TypeTag::Int32 | TypeTag::Float32 => Some(4),
            TypeTag::Int64 | TypeTag::Float64 => Some(8),
            TypeTag::Bool => Some(1),
            TypeTag::Text | TypeTag::Bytes | TypeTag::Opaque => None,
        }
    }
}
