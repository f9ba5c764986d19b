//! Batching configuration
//!
//! Controls destination normalization, deterministic-ID hashing and how
//! many workers group a record list.

use serde::{Deserialize, Serialize};

/// Default suffix appended to primary-key concatenations before hashing
/// (ASCII unit separator).
pub const DEFAULT_KEY_SENTINEL: &str = "\u{1F}";

/// Batching configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Rewrite each record's destination to its normalized form while
    /// grouping
    pub normalize_destinations: bool,
    /// Suffix appended to primary-key values before hashing; never empty
    pub id_key_sentinel: String,
    /// Number of workers grouping partitions of a record list
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            normalize_destinations: true,
            id_key_sentinel: DEFAULT_KEY_SENTINEL.to_string(),
            workers: 1,
        }
    }
}

impl BatchConfig {
    /// Create config for testing
    ///
    /// Uses several workers so partitioned grouping is exercised even for
    /// small inputs.
    pub fn for_testing() -> Self {
        BatchConfig {
            workers: 4,
            ..Default::default()
        }
    }

    /// Set destination normalization
    pub fn with_normalize_destinations(mut self, normalize: bool) -> Self {
        self.normalize_destinations = normalize;
        self
    }

    /// Set the deterministic-ID sentinel suffix
    pub fn with_id_key_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.id_key_sentinel = sentinel.into();
        self
    }

    /// Set the number of grouping workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_key_sentinel.is_empty() {
            return Err(ConfigError::EmptyKeySentinel);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(self.workers));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The deterministic-ID sentinel must not be empty
    #[error("id_key_sentinel must not be empty")]
    EmptyKeySentinel,

    /// Worker count out of range
    #[error("Invalid worker count: {0} (must be at least 1)")]
    InvalidWorkers(usize),
}
