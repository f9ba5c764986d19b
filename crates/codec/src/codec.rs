//! Field-Entry block encoder and decoder.
//!
//! `ValueCodec` is a small context object: it owns the opaque serializer
//! and nothing else, so it can be shared across threads or cloned per
//! worker. Encoding and decoding never touch shared mutable state.

use crate::format::{TypeTag, BOOL_FALSE, BOOL_TRUE, CODEC_ID, LENGTH_PREFIX_SIZE, MAX_LENGTH};
use crate::opaque::{MsgpackSerializer, OpaqueSerializer};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use once_cell::sync::Lazy;
use rowpack_core::{Error, Fields, Result, Value};
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{trace, warn};

static DEFAULT_CODEC: Lazy<ValueCodec> = Lazy::new(ValueCodec::default);

/// Encode a field map with the default codec (no opaque types registered)
pub fn encode_fields(fields: &Fields) -> Result<Vec<u8>> {
    DEFAULT_CODEC.encode(fields)
}

/// Decode a block with the default codec (no opaque types registered)
pub fn decode_fields(data: &[u8], columns: Option<&HashSet<String>>) -> Result<Fields> {
    DEFAULT_CODEC.decode(data, columns)
}

/// Encoder/decoder for Field-Entry blocks.
#[derive(Clone)]
pub struct ValueCodec {
    serializer: Arc<dyn OpaqueSerializer>,
}

impl Default for ValueCodec {
    fn default() -> Self {
        ValueCodec::new(Arc::new(MsgpackSerializer::new()))
    }
}

impl fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCodec")
            .field("codec_id", &CODEC_ID)
            .field("serializer", &self.serializer.serializer_id())
            .finish()
    }
}

impl ValueCodec {
    /// Create a codec delegating opaque values to `serializer`
    pub fn new(serializer: Arc<dyn OpaqueSerializer>) -> Self {
        ValueCodec { serializer }
    }

    /// Block format identifier
    pub fn codec_id(&self) -> &'static str {
        CODEC_ID
    }

    /// The opaque serializer in use
    pub fn serializer(&self) -> &dyn OpaqueSerializer {
        self.serializer.as_ref()
    }

    /// Encode all fields, in map order, into a new block.
    ///
    /// # Errors
    /// Returns `Encoding` if a field name is empty, the opaque serializer
    /// fails, or a name or payload is too long for the format.
    pub fn encode(&self, fields: &Fields) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(fields, &mut out)?;
        trace!(fields = fields.len(), bytes = out.len(), "encoded block");
        Ok(out)
    }

    /// Encode all fields, in map order, into `writer`.
    ///
    /// Names are checked before the first byte is written.
    pub fn encode_into<W: Write>(&self, fields: &Fields, writer: &mut W) -> Result<()> {
        for name in fields.names() {
            check_name(name)?;
        }
        for (name, value) in fields.iter() {
            self.write_entry(name, value, writer)?;
        }
        Ok(())
    }

    /// Encode a single Field Entry.
    ///
    /// A block is exactly the concatenation of its entries.
    pub fn encode_entry(&self, name: &str, value: &Value) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_entry(name, value, &mut out)?;
        Ok(out)
    }

    fn write_entry<W: Write>(&self, name: &str, value: &Value, w: &mut W) -> Result<()> {
        check_name(name)?;
        let io_err = |e: io::Error| Error::Encoding(format!("field '{}': {}", name, e));

        write_len(w, name.len(), name)?;
        w.write_all(name.as_bytes()).map_err(io_err)?;
        w.write_u8(TypeTag::of(value).to_byte()).map_err(io_err)?;

        match value {
            Value::Null => {}
            Value::Text(s) => {
                write_len(w, s.len(), name)?;
                w.write_all(s.as_bytes()).map_err(io_err)?;
            }
            Value::Int32(i) => w.write_i32::<BigEndian>(*i).map_err(io_err)?,
            Value::Int64(i) => w.write_i64::<BigEndian>(*i).map_err(io_err)?,
            Value::Float32(f) => w.write_f32::<BigEndian>(*f).map_err(io_err)?,
            Value::Float64(f) => w.write_f64::<BigEndian>(*f).map_err(io_err)?,
            Value::Bool(b) => w
                .write_u8(if *b { BOOL_TRUE } else { BOOL_FALSE })
                .map_err(io_err)?,
            Value::Bytes(b) => {
                write_len(w, b.len(), name)?;
                w.write_all(b).map_err(io_err)?;
            }
            Value::Opaque(o) => {
                let blob = self.serializer.serialize(o).map_err(|e| {
                    Error::Encoding(format!("opaque value for field '{}': {}", name, e))
                })?;
                write_len(w, blob.len(), name)?;
                w.write_all(&blob).map_err(io_err)?;
            }
        }
        Ok(())
    }

    /// Decode a block.
    ///
    /// Entries are read from the start until the buffer is exhausted or a
    /// zero name length is found; a zero name length ends the block and any
    /// bytes after it are ignored.
    ///
    /// With `columns`, entries whose name is not in the set are skipped:
    /// their lengths and tag are still checked so the cursor stays aligned,
    /// but their payload is not materialized (opaque blobs are not handed to
    /// the serializer).
    ///
    /// # Errors
    /// Returns `Format` for truncated input, unknown tags, invalid bool
    /// bytes, invalid UTF-8, or an opaque payload the serializer cannot
    /// rebuild. No partial map is returned.
    pub fn decode(&self, data: &[u8], columns: Option<&HashSet<String>>) -> Result<Fields> {
        let mut reader = BlockReader::new(data);
        let mut fields = Fields::new();

        while reader.remaining() > 0 {
            let name_len = reader.read_len("field name length")?;
            if name_len == 0 {
                if reader.remaining() > 0 {
                    warn!(
                        offset = reader.position(),
                        trailing = reader.remaining(),
                        "zero name length ends block before end of buffer"
                    );
                }
                break;
            }
            let name = reader.read_str(name_len, "field name")?;
            let keep = columns.map_or(true, |cols| cols.contains(name));

            let tag_offset = reader.position();
            let tag_byte = reader.read_u8("type tag")?;
            let tag = TypeTag::from_byte(tag_byte).ok_or_else(|| {
                Error::format(
                    format!("unknown type tag 0x{:02x} for field '{}'", tag_byte, name),
                    tag_offset,
                )
            })?;

            if keep {
                let value = self.read_value(&mut reader, tag, name)?;
                fields.insert(name, value);
            } else {
                skip_value(&mut reader, tag, name)?;
            }
        }

        Ok(fields)
    }

    fn read_value(&self, r: &mut BlockReader<'_>, tag: TypeTag, name: &str) -> Result<Value> {
        let value = match tag {
            TypeTag::Null => Value::Null,
            TypeTag::Text => {
                let len = r.read_len("text length")?;
                Value::Text(r.read_str(len, "text value")?.to_string())
            }
            TypeTag::Int32 => Value::Int32(BigEndian::read_i32(r.take(4, "int32 value")?)),
            TypeTag::Int64 => Value::Int64(BigEndian::read_i64(r.take(8, "int64 value")?)),
            TypeTag::Float32 => Value::Float32(BigEndian::read_f32(r.take(4, "float32 value")?)),
            TypeTag::Float64 => Value::Float64(BigEndian::read_f64(r.take(8, "float64 value")?)),
            TypeTag::Bool => {
                let offset = r.position();
                match r.read_u8("bool value")? {
                    BOOL_TRUE => Value::Bool(true),
                    BOOL_FALSE => Value::Bool(false),
                    other => {
                        return Err(Error::format(
                            format!("invalid encoded boolean 0x{:02x} for field '{}'", other, name),
                            offset,
                        ))
                    }
                }
            }
            TypeTag::Bytes => {
                let len = r.read_len("bytes length")?;
                Value::Bytes(r.take(len, "bytes value")?.to_vec())
            }
            TypeTag::Opaque => {
                let len = r.read_len("opaque length")?;
                let offset = r.position();
                let blob = r.take(len, "opaque value")?;
                let value = self.serializer.deserialize(blob).map_err(|e| {
                    Error::format_with_source(
                        format!("cannot rebuild opaque value for field '{}'", name),
                        offset,
                        e,
                    )
                })?;
                Value::Opaque(value)
            }
        };
        Ok(value)
    }
}

/// Advance past a payload without materializing it. Text must still be
/// UTF-8 and bools 0 or 1; opaque blobs are not rebuilt.
fn skip_value(r: &mut BlockReader<'_>, tag: TypeTag, name: &str) -> Result<()> {
    match tag {
        TypeTag::Text => {
            let len = r.read_len("text length")?;
            r.read_str(len, "text value")?;
        }
        TypeTag::Bool => {
            let offset = r.position();
            let byte = r.read_u8("bool value")?;
            if byte != BOOL_TRUE && byte != BOOL_FALSE {
                return Err(Error::format(
                    format!("invalid encoded boolean 0x{:02x} for field '{}'", byte, name),
                    offset,
                ));
            }
        }
        _ => {
            let width = match tag.fixed_width() {
                Some(width) => width,
                None => r.read_len("payload length")?,
            };
            r.take(width, "skipped payload")?;
        }
    }
    Ok(())
}

// A zero name length marks the end of a block.
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Encoding("field name must not be empty".to_string()));
    }
    Ok(())
}

fn write_len<W: Write>(w: &mut W, len: usize, name: &str) -> Result<()> {
    if len > MAX_LENGTH {
        return Err(Error::Encoding(format!(
            "field '{}': length {} exceeds format maximum {}",
            name, len, MAX_LENGTH
        )));
    }
    w.write_u32::<BigEndian>(len as u32)
        .map_err(|e| Error::Encoding(format!("field '{}': {}", name, e)))
}

/// Bounds-checked cursor over a block.
///
/// Every read checks the remaining length first, so a corrupt length
/// prefix can never trigger an oversized allocation.
struct BlockReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlockReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        BlockReader { data, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::format(
                format!(
                    "truncated {}: need {} bytes, {} remaining",
                    what,
                    len,
                    self.remaining()
                ),
                self.pos,
            ));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn read_len(&mut self, what: &str) -> Result<usize> {
        let offset = self.pos;
        let len = BigEndian::read_u32(self.take(LENGTH_PREFIX_SIZE, what)?) as usize;
        if len > MAX_LENGTH {
            return Err(Error::format(
                format!("{} {} exceeds format maximum {}", what, len, MAX_LENGTH),
                offset,
            ));
        }
        Ok(len)
    }

    fn read_str(&mut self, len: usize, what: &str) -> Result<&'a str> {
        let offset = self.pos;
        let bytes = self.take(len, what)?;
        std::str::from_utf8(bytes).map_err(|e| {
            Error::format_with_source(format!("{} is not valid UTF-8", what), offset, e)
        })
    }
}
