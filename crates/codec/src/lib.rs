//! Field-Entry block codec for rowpack
//!
//! This crate turns a record's ordered field map into the persisted byte
//! block and back:
//!
//! - `format`: Frozen wire layout (type tags, length prefixes)
//! - `codec`: `ValueCodec` encoder/decoder and default-codec helpers
//! - `opaque`: `OpaqueSerializer` seam and the MessagePack registry
//!
//! # Usage
//!
//! ```ignore
//! use rowpack_codec::{decode_fields, encode_fields};
//!
//! let block = encode_fields(&fields)?;
//! let decoded = decode_fields(&block, None)?;
//! assert_eq!(decoded, fields);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod format;
pub mod opaque;

pub use codec::{decode_fields, encode_fields, ValueCodec};
pub use format::{TypeTag, CODEC_ID, CODEC_VERSION};
pub use opaque::{MsgpackSerializer, OpaqueError, OpaqueSerializer, MSGPACK_SERIALIZER_ID};
