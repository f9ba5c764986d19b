//! Identity tests: key-derived and random identifiers through the pipeline.

use crate::common::*;
use rowpack::{deterministic_id, BatchConfig, Fields, IdentityResolver, Value};
use std::collections::HashSet;
use uuid::Uuid;

#[test]
fn keyed_destinations_get_name_based_ids() {
    let mut p = pipeline(BatchConfig::default(), 10);
    let out = p.prepare(vec![order("orders", "acme", 42, 3.0)], &schema()).unwrap();
    assert_eq!(out[0].identifier, "3c442a92-c36e-3cd1-936f-de1942c29586");

    let parsed = Uuid::parse_str(&out[0].identifier).unwrap();
    assert_eq!(parsed.get_version_num(), 3);
}

#[test]
fn identical_keys_collapse_across_calls() {
    let mut first = pipeline(BatchConfig::default(), 11);
    let mut second = pipeline(BatchConfig::default(), 12);
    let a = first.prepare(vec![order("orders", "acme", 9, 1.0)], &schema()).unwrap();
    let b = second.prepare(vec![order("ORDERS", "acme", 9, 500.0)], &schema()).unwrap();
    assert_eq!(a[0].identifier, b[0].identifier);
}

#[test]
fn key_order_matters() {
    let mut fields = Fields::new();
    fields.insert("tenant", "acme");
    fields.insert("order_id", Value::Int64(42));
    let forward = deterministic_id(&fields, &["tenant", "order_id"], "\u{1F}").unwrap();
    let reverse = deterministic_id(&fields, &["order_id", "tenant"], "\u{1F}").unwrap();
    assert_ne!(forward, reverse);
}

#[test]
fn missing_and_null_keys_contribute_nothing() {
    let mut with_null = Fields::new();
    with_null.insert("tenant", "acme");
    with_null.insert("order_id", Value::Null);
    let mut without = Fields::new();
    without.insert("tenant", "acme");

    let keys = ["tenant", "order_id"];
    assert_eq!(
        deterministic_id(&with_null, &keys, "\u{1F}").unwrap(),
        deterministic_id(&without, &keys, "\u{1F}").unwrap()
    );
}

#[test]
fn sentinel_is_configurable() {
    let config = BatchConfig::default().with_id_key_sentinel("|");
    let mut custom = pipeline(config, 13);
    let mut default = pipeline(BatchConfig::default(), 13);
    let a = custom.prepare(vec![order("orders", "acme", 1, 0.0)], &schema()).unwrap();
    let b = default.prepare(vec![order("orders", "acme", 1, 0.0)], &schema()).unwrap();
    assert_ne!(a[0].identifier, b[0].identifier);
}

#[test]
fn unkeyed_destinations_get_distinct_random_ids() {
    let mut p = pipeline(BatchConfig::default(), 14);
    let records = (0..500).map(|i| click("clicks", i)).collect();
    let out = p.prepare(records, &schema()).unwrap();
    let ids: HashSet<_> = out.iter().map(|r| r.identifier.clone()).collect();
    assert_eq!(ids.len(), 500);
    for id in &ids {
        assert_eq!(id.len(), 36);
        Uuid::parse_str(id).unwrap();
    }
}

#[test]
fn os_seeded_resolvers_do_not_repeat() {
    let mut a = IdentityResolver::new();
    let mut b = IdentityResolver::new();
    let ids: HashSet<_> = (0..1000)
        .flat_map(|_| [a.generate_random_id(), b.generate_random_id()])
        .collect();
    assert_eq!(ids.len(), 2000);
}
