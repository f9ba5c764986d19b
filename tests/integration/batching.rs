//! Batching tests: destination grouping, ordering and partitioning.

use crate::common::*;
use rowpack::{
    compact_destination_name, group_by_destination, group_partitioned, group_records,
    merge_batches, split_range, stream_to_destination, Record, Value,
};

fn seqs(records: &[Record]) -> Vec<i32> {
    records
        .iter()
        .map(|r| match r.get("seq") {
            Some(Value::Int32(seq)) => *seq,
            other => panic!("unexpected seq {:?}", other),
        })
        .collect()
}

#[test]
fn batches_follow_first_seen_destination_order() {
    let records = vec![
        click("b", 0),
        click("a", 1),
        click("B", 2),
        click("c", 3),
        click("A", 4),
    ];
    let batches = group_by_destination(records, true).unwrap();
    let keys: Vec<_> = batches.iter().map(|b| b.key()).collect();
    assert_eq!(keys, vec!["B", "A", "C"]);
    assert_eq!(seqs(batches[0].records()), vec![0, 2]);
    assert_eq!(seqs(batches[1].records()), vec![1, 4]);
    assert_eq!(seqs(batches[2].records()), vec![3]);
}

#[test]
fn normalization_rewrites_destinations() {
    let batches = group_by_destination(vec![click("events", 0)], true).unwrap();
    assert_eq!(batches[0].records()[0].destination_id(), "EVENTS");
}

#[test]
fn plain_grouping_keeps_destinations() {
    let batches = group_records(vec![click("events", 0), click("Events", 1)]).unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].records()[0].destination_id(), "events");
    assert_eq!(batches[0].records()[1].destination_id(), "Events");
}

#[test]
fn grouping_keeps_every_record() {
    let records: Vec<Record> = (0..100)
        .map(|i| click(["x", "y", "z", "X"][i as usize % 4], i))
        .collect();
    let batches = group_by_destination(records, true).unwrap();
    let total: usize = batches.iter().map(|b| b.len()).sum();
    assert_eq!(total, 100);
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].len(), 50);
}

#[test]
fn partitioned_grouping_preserves_order_within_batches() {
    let records: Vec<Record> = (0..37).map(|i| click(if i % 3 == 0 { "a" } else { "b" }, i)).collect();
    let batches = group_partitioned(records, 5, true).unwrap();
    assert_eq!(batches.len(), 2);
    let a = batches.iter().find(|b| b.key() == "A").unwrap();
    let expected: Vec<i32> = (0..37).filter(|i| i % 3 == 0).collect();
    assert_eq!(seqs(a.records()), expected);
}

#[test]
fn merging_partition_results() {
    let first = group_by_destination(vec![click("a", 0), click("b", 1)], true).unwrap();
    let second = group_by_destination(vec![click("c", 2), click("a", 3)], true).unwrap();
    let merged = merge_batches(vec![first, second]);
    let keys: Vec<_> = merged.iter().map(|b| b.key().to_string()).collect();
    assert_eq!(keys, vec!["A", "B", "C"]);
    assert_eq!(seqs(merged[0].records()), vec![0, 3]);
}

#[test]
fn split_ranges_feed_partitions() {
    assert_eq!(split_range(10, 4), vec![(0, 2), (2, 2), (4, 2), (6, 4)]);
    assert_eq!(split_range(3, 8), vec![(0, 1), (1, 1), (2, 1)]);
}

#[test]
fn stream_names_map_to_compact_destinations() {
    let destination = stream_to_destination("org.wso2.events");
    assert_eq!(destination, "org_wso2_events");
    let compact = compact_destination_name(&destination.to_uppercase());
    assert_eq!(compact, "ANXCa_Ovg__");
}
