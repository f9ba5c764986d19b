//! Record batching and identity resolution for rowpack
//!
//! This crate prepares record lists for a record store:
//!
//! - Batcher: One batch per normalized destination, input order preserved
//! - Identity: Random or primary-key-derived record identifiers
//! - Schema: Primary-key metadata lookup
//! - Partition: Range splitting and concurrent grouping
//! - Naming: Stream-to-destination and compact destination names
//! - Config: Batching configuration
//! - Pipeline: Group, assign identifiers and encode in one call

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batcher;
pub mod config;
pub mod identity;
pub mod naming;
pub mod partition;
pub mod pipeline;
pub mod schema;

pub use batcher::{
    group_by_destination, group_records, merge_batches, normalize_destination, record_identity,
    RecordBatch,
};
pub use config::{BatchConfig, ConfigError, DEFAULT_KEY_SENTINEL};
pub use identity::{deterministic_id, IdentityResolver};
pub use naming::{compact_destination_name, destination_hash, stream_to_destination};
pub use partition::{group_partitioned, split_range};
pub use pipeline::{EncodedRecord, RecordPipeline};
pub use schema::{PrimaryKeySpec, SchemaLookup, SchemaRegistry};
