//! Record pipeline: group, assign identifiers, encode.
//!
//! One pipeline per worker. It owns its identity resolver (and therefore
//! its random generator); the codec may be shared.

use crate::batcher::{group_by_destination, RecordBatch};
use crate::config::{BatchConfig, ConfigError};
use crate::identity::IdentityResolver;
use crate::partition::group_partitioned;
use crate::schema::SchemaLookup;
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore};
use rowpack_codec::ValueCodec;
use rowpack_core::{Error, Fields, Record, Result};
use std::collections::HashSet;
use tracing::debug;

/// A record ready for the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRecord {
    /// Destination (normalized if the pipeline normalizes)
    pub destination_id: String,
    /// Assigned or upstream identifier
    pub identifier: String,
    /// Field-Entry block
    pub block: Vec<u8>,
}

impl EncodedRecord {
    /// Decode the block back into fields
    pub fn decode(&self, codec: &ValueCodec, columns: Option<&HashSet<String>>) -> Result<Fields> {
        codec.decode(&self.block, columns)
    }
}

/// Groups records, assigns missing identifiers and encodes them.
pub struct RecordPipeline<R = StdRng> {
    config: BatchConfig,
    codec: ValueCodec,
    resolver: IdentityResolver<R>,
}

impl RecordPipeline<StdRng> {
    /// Create a pipeline with an OS-seeded resolver.
    ///
    /// # Errors
    /// Returns the validation error if `config` is invalid.
    pub fn new(config: BatchConfig, codec: ValueCodec) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let resolver = IdentityResolver::from_config(&config)?;
        Ok(RecordPipeline {
            config,
            codec,
            resolver,
        })
    }
}

impl<R: RngCore + CryptoRng> RecordPipeline<R> {
    /// Create a pipeline with an injected generator
    pub fn with_rng(
        config: BatchConfig,
        codec: ValueCodec,
        rng: R,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let resolver =
            IdentityResolver::with_rng(rng).with_key_sentinel(config.id_key_sentinel.clone())?;
        Ok(RecordPipeline {
            config,
            codec,
            resolver,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Codec in use
    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    /// Group records into batches and assign missing identifiers.
    pub fn batch<S>(&mut self, records: Vec<Record>, schema: &S) -> Result<Vec<RecordBatch>>
    where
        S: SchemaLookup + ?Sized,
    {
        let normalize = self.config.normalize_destinations;
        let mut batches = if self.config.workers > 1 {
            group_partitioned(records, self.config.workers, normalize)?
        } else {
            group_by_destination(records, normalize)?
        };
        self.resolver.pre_process(&mut batches, schema)?;
        Ok(batches)
    }

    /// Group, assign identifiers and encode every record.
    ///
    /// Output is ordered batch by batch; within a batch, records keep their
    /// input order. Fails on the first record that cannot be encoded.
    pub fn prepare<S>(&mut self, records: Vec<Record>, schema: &S) -> Result<Vec<EncodedRecord>>
    where
        S: SchemaLookup + ?Sized,
    {
        let batches = self.batch(records, schema)?;
        let batch_count = batches.len();

        let mut encoded = Vec::new();
        for batch in batches {
            for record in batch.into_records() {
                let block = self.codec.encode(record.fields())?;
                let (destination_id, identifier, _) = record.into_parts();
                let identifier = identifier.ok_or_else(|| {
                    Error::InvalidRecord(format!(
                        "record for '{}' has no identifier after pre-processing",
                        destination_id
                    ))
                })?;
                encoded.push(EncodedRecord {
                    destination_id,
                    identifier,
                    block,
                });
            }
        }

        debug!(batches = batch_count, records = encoded.len(), "prepared records");
        Ok(encoded)
    }
}
