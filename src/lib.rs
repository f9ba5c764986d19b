//! Rowpack - record serialization and batching for analytics record stores
//!
//! Rowpack turns lists of loosely typed records into storage-ready form:
//! records are grouped per destination, given stable identifiers and
//! encoded into compact Field-Entry blocks.
//!
//! # Quick Start
//!
//! ```ignore
//! use rowpack::{BatchConfig, Fields, PrimaryKeySpec, Record, RecordPipeline, SchemaRegistry, Value, ValueCodec};
//!
//! let schema = SchemaRegistry::new().with_table("users", PrimaryKeySpec::new(["email"]));
//! let mut pipeline = RecordPipeline::new(BatchConfig::default(), ValueCodec::default())?;
//!
//! let mut fields = Fields::new();
//! fields.insert("email", Value::from("a@example.com"));
//! let encoded = pipeline.prepare(vec![Record::new("users", fields)?], &schema)?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ rowpack-batch   group · identify · pipeline  │
//! ├──────────────────────────────────────────────┤
//! │ rowpack-codec   Field-Entry codec · opaque   │
//! ├──────────────────────────────────────────────┤
//! │ rowpack-core    Value · Fields · Record      │
//! └──────────────────────────────────────────────┘
//! ```

pub use rowpack_batch::*;
pub use rowpack_codec::*;
pub use rowpack_core::*;
