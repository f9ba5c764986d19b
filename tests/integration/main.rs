//! Integration Tests
//!
//! End-to-end tests across the rowpack crates:
//! - Pipeline: group, identify and encode in one call
//! - Batching: destination grouping and ordering
//! - Identity: random and key-derived identifiers
//! - Concurrency: per-worker resolvers over a shared codec

#[path = "../common/mod.rs"]
mod common;

mod batching;
mod concurrency;
mod identity;
mod pipeline;
