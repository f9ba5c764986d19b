//! Record identity resolution.
//!
//! Identifiers are either random (128 bits from a cryptographically secure
//! generator) or derived from primary-key values with an MD5 name-based
//! UUID, so re-ingesting the same logical row yields the same identifier.
//!
//! `IdentityResolver` owns its generator. Give every worker its own
//! resolver; there is no process-wide generator.

use crate::batcher::RecordBatch;
use crate::config::{BatchConfig, ConfigError, DEFAULT_KEY_SENTINEL};
use crate::schema::SchemaLookup;
use md5::{Digest, Md5};
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rowpack_core::{Fields, Result};
use tracing::debug;
use uuid::{Builder, Uuid};

/// Derive an identifier from primary-key values.
///
/// Concatenates the text form of each key's value in `primary_keys` order
/// (a missing key or a `Null` value adds nothing), appends `sentinel`, and
/// hashes the UTF-8 bytes into a version-3 UUID string.
///
/// Key order is part of the identity: `[a, b]` and `[b, a]` give different
/// identifiers for the same record.
///
/// # Errors
/// Returns `EmptyKeySentinel` if `sentinel` is empty, since the hashed
/// text could then be empty.
pub fn deterministic_id<S: AsRef<str>>(
    fields: &Fields,
    primary_keys: &[S],
    sentinel: &str,
) -> std::result::Result<String, ConfigError> {
    if sentinel.is_empty() {
        return Err(ConfigError::EmptyKeySentinel);
    }
    Ok(hash_key_values(fields, primary_keys, sentinel))
}

fn hash_key_values<S: AsRef<str>>(fields: &Fields, primary_keys: &[S], sentinel: &str) -> String {
    let mut material = String::new();
    for key in primary_keys {
        if let Some(text) = fields.get(key.as_ref()).and_then(|v| v.key_text()) {
            material.push_str(&text);
        }
    }
    material.push_str(sentinel);

    let digest = Md5::digest(material.as_bytes());
    let mut md5_bytes = [0u8; 16];
    md5_bytes.copy_from_slice(&digest);
    Builder::from_md5_bytes(md5_bytes).into_uuid().to_string()
}

/// Generates record identifiers and fills in missing ones.
pub struct IdentityResolver<R = StdRng> {
    rng: R,
    key_sentinel: String,
}

impl IdentityResolver<StdRng> {
    /// Create a resolver seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a resolver using the sentinel from `config`
    pub fn from_config(config: &BatchConfig) -> std::result::Result<Self, ConfigError> {
        Self::new().with_key_sentinel(config.id_key_sentinel.clone())
    }
}

impl Default for IdentityResolver<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> IdentityResolver<R> {
    /// Create a resolver with an injected generator
    pub fn with_rng(rng: R) -> Self {
        IdentityResolver {
            rng,
            key_sentinel: DEFAULT_KEY_SENTINEL.to_string(),
        }
    }

    /// Override the deterministic-ID sentinel suffix.
    ///
    /// # Errors
    /// Returns `EmptyKeySentinel` for an empty sentinel.
    pub fn with_key_sentinel(
        mut self,
        sentinel: impl Into<String>,
    ) -> std::result::Result<Self, ConfigError> {
        let sentinel = sentinel.into();
        if sentinel.is_empty() {
            return Err(ConfigError::EmptyKeySentinel);
        }
        self.key_sentinel = sentinel;
        Ok(self)
    }

    /// Sentinel suffix in use
    pub fn key_sentinel(&self) -> &str {
        &self.key_sentinel
    }

    /// 128 random bits in the canonical dashed hex layout.
    ///
    /// No version or variant bits are forced; all 128 bits are random.
    pub fn generate_random_id(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        Uuid::from_bytes(bytes).to_string()
    }

    /// Identifier derived from `primary_keys` values (see [`deterministic_id`])
    pub fn generate_deterministic_id<S: AsRef<str>>(&self, fields: &Fields, primary_keys: &[S]) -> String {
        hash_key_values(fields, primary_keys, &self.key_sentinel)
    }

    /// Assign identifiers to every record that lacks one.
    ///
    /// Primary keys are looked up once per batch using its first record.
    /// With primary keys, missing identifiers are derived from key values;
    /// without, they are random. Records that already carry an identifier
    /// are left untouched. Only identifiers are modified.
    ///
    /// # Errors
    /// Returns `InvalidRecord` for a record with an empty destination, and
    /// propagates schema lookup failures.
    pub fn pre_process<S>(&mut self, batches: &mut [RecordBatch], schema: &S) -> Result<()>
    where
        S: SchemaLookup + ?Sized,
    {
        for batch in batches.iter_mut() {
            self.pre_process_batch(batch, schema)?;
        }
        Ok(())
    }

    fn pre_process_batch<S>(&mut self, batch: &mut RecordBatch, schema: &S) -> Result<()>
    where
        S: SchemaLookup + ?Sized,
    {
        let Some(first) = batch.records().first() else {
            return Ok(());
        };
        first.validate()?;
        let spec = schema.primary_keys(first.destination_id())?;

        let mut assigned = 0usize;
        for record in batch.records_mut() {
            record.validate()?;
            if record.has_identifier() {
                continue;
            }
            let id = if spec.is_empty() {
                self.generate_random_id()
            } else {
                self.generate_deterministic_id(record.fields(), spec.names())
            };
            record.assign_identifier(id);
            assigned += 1;
        }

        debug!(
            destination = batch.key(),
            records = batch.len(),
            assigned,
            primary_keys = spec.len(),
            "assigned record identifiers"
        );
        Ok(())
    }
}
