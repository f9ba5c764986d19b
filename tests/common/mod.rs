//! Shared test utilities for the integration suite.
//!
//! Import via `mod common;` from a test's main.rs.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use rowpack::{
    BatchConfig, Fields, MsgpackSerializer, PrimaryKeySpec, Record, RecordPipeline,
    SchemaRegistry, Value, ValueCodec,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Once};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route tracing output through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Fixtures
// ============================================================================

/// Application-defined payload carried as an opaque value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

/// Codec whose serializer knows [`GeoPoint`].
pub fn geo_codec() -> ValueCodec {
    let serializer = MsgpackSerializer::new()
        .register::<GeoPoint>("geo-point")
        .expect("register geo-point");
    ValueCodec::new(Arc::new(serializer))
}

/// Schema with one keyed table and one unkeyed table.
pub fn schema() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_table("orders", PrimaryKeySpec::new(["tenant", "order_id"]))
        .with_table("clicks", PrimaryKeySpec::none())
}

/// An order record for `orders`-like destinations.
pub fn order(destination: &str, tenant: &str, order_id: i64, amount: f64) -> Record {
    let mut fields = Fields::new();
    fields.insert("tenant", tenant);
    fields.insert("order_id", Value::Int64(order_id));
    fields.insert("amount", Value::Float64(amount));
    fields.insert("paid", Value::Bool(order_id % 2 == 0));
    Record::new(destination, fields).expect("valid order")
}

/// A click record with no natural key.
pub fn click(destination: &str, seq: i32) -> Record {
    let mut fields = Fields::new();
    fields.insert("seq", Value::Int32(seq));
    fields.insert("referrer", Value::Null);
    Record::new(destination, fields).expect("valid click")
}

/// Seeded pipeline with the given configuration.
pub fn pipeline(config: BatchConfig, seed: u64) -> RecordPipeline<StdRng> {
    init_tracing();
    RecordPipeline::with_rng(config, geo_codec(), StdRng::seed_from_u64(seed))
        .expect("valid config")
}
