//! Primary-key metadata supplied by the schema collaborator.

use crate::batcher::normalize_destination;
use rowpack_core::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Ordered primary-key field names for a destination's schema.
///
/// Order matters: deterministic identifiers concatenate key values in this
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryKeySpec(Vec<String>);

impl PrimaryKeySpec {
    /// Create a spec from ordered field names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PrimaryKeySpec(names.into_iter().map(Into::into).collect())
    }

    /// A spec with no primary keys
    pub fn none() -> Self {
        PrimaryKeySpec(Vec::new())
    }

    /// Field names in key order
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Check if no primary keys are defined
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of key fields
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Lookup of primary-key metadata by destination.
pub trait SchemaLookup {
    /// Primary keys for `destination_id`; an empty spec means none defined
    fn primary_keys(&self, destination_id: &str) -> Result<PrimaryKeySpec>;
}

impl<F> SchemaLookup for F
where
    F: Fn(&str) -> Result<PrimaryKeySpec>,
{
    fn primary_keys(&self, destination_id: &str) -> Result<PrimaryKeySpec> {
        self(destination_id)
    }
}

/// Plain maps are looked up by the destination exactly as given; a
/// destination without an entry has no primary keys.
impl<H: BuildHasher> SchemaLookup for HashMap<String, PrimaryKeySpec, H> {
    fn primary_keys(&self, destination_id: &str) -> Result<PrimaryKeySpec> {
        Ok(self.get(destination_id).cloned().unwrap_or_default())
    }
}

/// In-memory schema registry keyed by normalized destination.
///
/// Looking up a destination that was never defined is an error, matching
/// a record store that refuses writes to unknown tables.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: FxHashMap<String, PrimaryKeySpec>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a destination's primary keys
    pub fn define(&mut self, destination_id: &str, spec: PrimaryKeySpec) {
        self.tables.insert(normalize_destination(destination_id), spec);
    }

    /// Builder-style `define`
    pub fn with_table(mut self, destination_id: &str, spec: PrimaryKeySpec) -> Self {
        self.define(destination_id, spec);
        self
    }

    /// Check whether a destination is defined
    pub fn contains(&self, destination_id: &str) -> bool {
        self.tables
            .contains_key(&normalize_destination(destination_id))
    }
}

impl SchemaLookup for SchemaRegistry {
    fn primary_keys(&self, destination_id: &str) -> Result<PrimaryKeySpec> {
        self.tables
            .get(&normalize_destination(destination_id))
            .cloned()
            .ok_or_else(|| Error::Schema(format!("unknown destination: {}", destination_id)))
    }
}
