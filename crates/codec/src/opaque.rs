//! Opaque value serializer.
//!
//! Field values that are not one of the fixed primitive kinds travel as
//! `Value::Opaque` and are turned into bytes by an `OpaqueSerializer`. The
//! block codec only length-prefixes the blob; everything needed to rebuild
//! the typed value must be inside the blob itself.
//!
//! # Thread Safety
//!
//! Serializers must be `Send + Sync` so one instance can serve concurrent
//! encode/decode calls. `MsgpackSerializer` is immutable after
//! construction.
//!
//! # Blob Layout (`MsgpackSerializer`)
//!
//! ```text
//! [body_len: u32 BE][type_name_len: u16 BE][type_name: UTF-8][MessagePack payload]
//! ```
//!
//! `body_len` counts every byte after itself. The type name is the name the
//! type was registered under, not the Rust type path, so renaming a Rust type
//! does not orphan stored data.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use rowpack_core::OpaqueValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

/// Pluggable serializer for opaque field values.
///
/// Implementations must stay behaviorally stable for as long as data they
/// produced is stored: a blob written by one deployment must deserialize to
/// an equal value in every later one.
pub trait OpaqueSerializer: Send + Sync {
    /// Serialize an opaque value into a self-describing blob
    fn serialize(&self, value: &OpaqueValue) -> Result<Vec<u8>, OpaqueError>;

    /// Rebuild an opaque value from a blob produced by `serialize`
    fn deserialize(&self, data: &[u8]) -> Result<OpaqueValue, OpaqueError>;

    /// Unique serializer identifier
    fn serializer_id(&self) -> &str;
}

/// Opaque serializer errors.
#[derive(Debug, thiserror::Error)]
pub enum OpaqueError {
    /// The concrete type was never registered
    #[error("Unregistered opaque type: {0}")]
    UnregisteredType(&'static str),

    /// The blob names a type that is not registered
    #[error("Unknown opaque type name: {0}")]
    UnknownTypeName(String),

    /// A type name was registered twice
    #[error("Opaque type name already registered: {0}")]
    DuplicateName(String),

    /// The blob framing is inconsistent
    #[error("Malformed opaque blob: {0}")]
    Malformed(String),

    /// MessagePack encoding failed
    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding failed
    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Writing the blob to an output failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Identifier of `MsgpackSerializer`
pub const MSGPACK_SERIALIZER_ID: &str = "msgpack-registry-v1";

const BODY_LEN_SIZE: usize = 4;
const NAME_LEN_SIZE: usize = 2;

type EncodeFn = fn(&OpaqueValue) -> Result<Vec<u8>, OpaqueError>;
type DecodeFn = fn(&[u8]) -> Result<OpaqueValue, OpaqueError>;

struct Registration {
    name: String,
    encode: EncodeFn,
}

fn encode_as<T: Serialize + 'static>(value: &OpaqueValue) -> Result<Vec<u8>, OpaqueError> {
    let concrete = value
        .downcast_ref::<T>()
        .ok_or_else(|| OpaqueError::UnregisteredType(value.type_name()))?;
    Ok(rmp_serde::to_vec(concrete)?)
}

fn decode_as<T>(payload: &[u8]) -> Result<OpaqueValue, OpaqueError>
where
    T: DeserializeOwned + fmt::Debug + PartialEq + Send + Sync + 'static,
{
    let value: T = rmp_serde::from_slice(payload)?;
    Ok(OpaqueValue::new(value))
}

/// Registry-based serializer storing values as MessagePack.
///
/// ```ignore
/// let serializer = MsgpackSerializer::new()
///     .register::<GeoPoint>("geo-point")?
///     .register::<Vec<String>>("string-list")?;
/// ```
#[derive(Default)]
pub struct MsgpackSerializer {
    by_type: HashMap<TypeId, Registration>,
    by_name: HashMap<String, DecodeFn>,
}

impl MsgpackSerializer {
    /// Create a serializer with no registered types
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under a stable name.
    ///
    /// # Errors
    /// Returns `DuplicateName` if the name is taken, or `Malformed` if the
    /// name does not fit the 16-bit length prefix or is empty.
    pub fn register<T>(mut self, name: impl Into<String>) -> Result<Self, OpaqueError>
    where
        T: Serialize + DeserializeOwned + fmt::Debug + PartialEq + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() || name.len() > u16::MAX as usize {
            return Err(OpaqueError::Malformed(format!(
                "type name length {} out of range",
                name.len()
            )));
        }
        if self.by_name.contains_key(&name) {
            return Err(OpaqueError::DuplicateName(name));
        }
        self.by_name.insert(name.clone(), decode_as::<T> as DecodeFn);
        self.by_type.insert(
            TypeId::of::<T>(),
            Registration {
                name,
                encode: encode_as::<T> as EncodeFn,
            },
        );
        Ok(self)
    }

    /// Check whether `T` is registered
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Check if no types are registered
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Write the blob for `value` to `writer`
    pub fn serialize_into<W: Write>(
        &self,
        value: &OpaqueValue,
        writer: &mut W,
    ) -> Result<(), OpaqueError> {
        let registration = self
            .by_type
            .get(&value.type_id())
            .ok_or_else(|| OpaqueError::UnregisteredType(value.type_name()))?;
        let payload = (registration.encode)(value)?;
        let name = registration.name.as_bytes();

        let body_len = NAME_LEN_SIZE + name.len() + payload.len();
        let body_len = u32::try_from(body_len)
            .map_err(|_| OpaqueError::Malformed(format!("blob body of {} bytes", body_len)))?;

        writer.write_u32::<BigEndian>(body_len)?;
        writer.write_u16::<BigEndian>(name.len() as u16)?;
        writer.write_all(name)?;
        writer.write_all(&payload)?;
        Ok(())
    }
}

impl OpaqueSerializer for MsgpackSerializer {
    fn serialize(&self, value: &OpaqueValue) -> Result<Vec<u8>, OpaqueError> {
        let mut out = Vec::new();
        self.serialize_into(value, &mut out)?;
        Ok(out)
    }

    fn deserialize(&self, data: &[u8]) -> Result<OpaqueValue, OpaqueError> {
        if data.len() < BODY_LEN_SIZE + NAME_LEN_SIZE {
            return Err(OpaqueError::Malformed(format!(
                "blob of {} bytes is shorter than its header",
                data.len()
            )));
        }
        let body_len = BigEndian::read_u32(&data[..BODY_LEN_SIZE]) as usize;
        let body = &data[BODY_LEN_SIZE..];
        if body_len != body.len() {
            return Err(OpaqueError::Malformed(format!(
                "declared body length {} but {} bytes present",
                body_len,
                body.len()
            )));
        }

        let name_len = BigEndian::read_u16(&body[..NAME_LEN_SIZE]) as usize;
        let rest = &body[NAME_LEN_SIZE..];
        if name_len > rest.len() {
            return Err(OpaqueError::Malformed(format!(
                "type name length {} exceeds remaining {} bytes",
                name_len,
                rest.len()
            )));
        }
        let (name, payload) = rest.split_at(name_len);
        let name = std::str::from_utf8(name)
            .map_err(|e| OpaqueError::Malformed(format!("type name is not UTF-8: {}", e)))?;

        let decode = self
            .by_name
            .get(name)
            .ok_or_else(|| OpaqueError::UnknownTypeName(name.to_string()))?;
        decode(payload)
    }

    fn serializer_id(&self) -> &str {
        MSGPACK_SERIALIZER_ID
    }
}

impl fmt::Debug for MsgpackSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("MsgpackSerializer")
            .field("types", &names)
            .finish()
    }
}
