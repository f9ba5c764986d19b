//! Pipeline tests: grouping, identifiers and encoding together.

use crate::common::*;
use rowpack::{decode_fields, BatchConfig, Error, OpaqueValue, Record, Value};
use std::collections::HashSet;

#[test]
fn prepare_round_trips_fields_through_blocks() {
    let mut p = pipeline(BatchConfig::default(), 1);
    let records = vec![
        order("orders", "acme", 1, 10.5),
        click("clicks", 1),
        order("Orders", "acme", 2, 99.0),
    ];
    let originals: Vec<_> = records.iter().map(|r| r.fields().clone()).collect();

    let out = p.prepare(records, &schema()).unwrap();
    assert_eq!(out.len(), 3);

    // ORDERS batch first (first seen), then CLICKS
    assert_eq!(out[0].destination_id, "ORDERS");
    assert_eq!(out[1].destination_id, "ORDERS");
    assert_eq!(out[2].destination_id, "CLICKS");

    assert_eq!(out[0].decode(p.codec(), None).unwrap(), originals[0]);
    assert_eq!(out[1].decode(p.codec(), None).unwrap(), originals[2]);
    assert_eq!(out[2].decode(p.codec(), None).unwrap(), originals[1]);
}

#[test]
fn opaque_values_survive_the_pipeline() {
    let mut p = pipeline(BatchConfig::default(), 2);
    let point = GeoPoint {
        lat: 52.52,
        lon: 13.405,
        label: "berlin".into(),
    };
    let mut record = click("clicks", 7);
    record
        .fields_mut()
        .insert("location", OpaqueValue::new(point.clone()));

    let out = p.prepare(vec![record], &schema()).unwrap();
    let fields = out[0].decode(p.codec(), None).unwrap();
    let decoded = fields.get("location").and_then(Value::as_opaque).unwrap();
    assert_eq!(decoded.downcast_ref::<GeoPoint>(), Some(&point));
}

#[test]
fn unregistered_opaque_type_fails_encoding() {
    #[derive(Debug, PartialEq)]
    struct Unknown(u8);

    let mut p = pipeline(BatchConfig::default(), 3);
    let mut record = click("clicks", 1);
    record
        .fields_mut()
        .insert("blob", OpaqueValue::new(Unknown(1)));

    let err = p.prepare(vec![record], &schema()).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "got {:?}", err);
}

#[test]
fn column_projection_on_encoded_blocks() {
    let mut p = pipeline(BatchConfig::default(), 4);
    let out = p.prepare(vec![order("orders", "acme", 5, 1.25)], &schema()).unwrap();

    let columns: HashSet<String> = ["amount".to_string(), "missing".to_string()].into();
    let fields = out[0].decode(p.codec(), Some(&columns)).unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields.get("amount"), Some(&Value::Float64(1.25)));
}

#[test]
fn default_codec_reads_blocks_without_opaque_values() {
    let mut p = pipeline(BatchConfig::default(), 5);
    let out = p.prepare(vec![click("clicks", 3)], &schema()).unwrap();
    let fields = decode_fields(&out[0].block, None).unwrap();
    assert_eq!(fields.get("seq"), Some(&Value::Int32(3)));
    assert_eq!(fields.get("referrer"), Some(&Value::Null));
}

#[test]
fn upstream_identifiers_are_kept() {
    let mut p = pipeline(BatchConfig::default(), 6);
    let record = Record::with_identifier("orders", "upstream-1", order("x", "acme", 1, 0.0).fields().clone())
        .unwrap();
    let out = p.prepare(vec![record], &schema()).unwrap();
    assert_eq!(out[0].identifier, "upstream-1");
}

#[test]
fn unknown_destination_is_a_schema_error() {
    let mut p = pipeline(BatchConfig::default(), 7);
    let err = p.prepare(vec![click("sessions", 1)], &schema()).unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
}

#[test]
fn empty_input_prepares_nothing() {
    let mut p = pipeline(BatchConfig::default(), 8);
    assert!(p.prepare(Vec::new(), &schema()).unwrap().is_empty());
}
