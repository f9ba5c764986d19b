//! Concurrency tests: one pipeline per worker, codec shared between them.

use crate::common::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rowpack::{BatchConfig, EncodedRecord, Record, RecordPipeline};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn workload(worker: usize) -> Vec<Record> {
    (0..200)
        .map(|i| {
            if i % 2 == 0 {
                order("orders", "acme", i as i64, worker as f64)
            } else {
                click("clicks", (worker * 1000 + i) as i32)
            }
        })
        .collect()
}

#[test]
fn workers_share_a_codec() {
    init_tracing();
    let codec = geo_codec();
    let registry = Arc::new(schema());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let codec = codec.clone();
            let registry = Arc::clone(&registry);
            thread::spawn(move || -> Vec<EncodedRecord> {
                let mut p = RecordPipeline::with_rng(
                    BatchConfig::default(),
                    codec,
                    StdRng::seed_from_u64(worker as u64 + 100),
                )
                .unwrap();
                p.prepare(workload(worker), registry.as_ref()).unwrap()
            })
        })
        .collect();

    let results: Vec<Vec<EncodedRecord>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Keyed records derive the same identifiers on every worker
    let order_ids: Vec<Vec<&str>> = results
        .iter()
        .map(|out| {
            out.iter()
                .filter(|r| r.destination_id == "ORDERS")
                .map(|r| r.identifier.as_str())
                .collect()
        })
        .collect();
    for ids in &order_ids[1..] {
        assert_eq!(ids, &order_ids[0]);
    }

    // Random identifiers never collide across workers
    let click_ids: HashSet<&str> = results
        .iter()
        .flatten()
        .filter(|r| r.destination_id == "CLICKS")
        .map(|r| r.identifier.as_str())
        .collect();
    assert_eq!(click_ids.len(), 4 * 100);

    for record in results.iter().flatten() {
        record.decode(&codec, None).unwrap();
    }
}

#[test]
fn partitioned_pipeline_matches_single_worker() {
    let mut single = pipeline(BatchConfig::default(), 1);
    let mut partitioned = pipeline(BatchConfig::default().with_workers(6), 1);

    let records: Vec<Record> = (0..120)
        .map(|i| order(["orders", "Orders", "ORDERS"][i % 3], "acme", i as i64, 0.5))
        .collect();

    let a = single.prepare(records.clone(), &schema()).unwrap();
    let b = partitioned.prepare(records, &schema()).unwrap();
    assert_eq!(a, b);
}
