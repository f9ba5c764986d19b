//! Partitioned grouping.
//!
//! A large record list can be cut into contiguous partitions, grouped on
//! separate threads and merged. Batches are keyed only by normalized
//! destination, so the merged result matches sequential grouping up to
//! batch order.

use crate::batcher::{group_by_destination, merge_batches, RecordBatch};
use rowpack_core::{Record, Result};
use tracing::debug;

/// Split `count` items into at most `nsplit` contiguous `(start, len)` ranges.
///
/// Every range but the last has `max(1, count / nsplit)` items; the last
/// takes whatever remains. Fewer than `nsplit` ranges are returned when
/// there are fewer items than splits. `nsplit == 0` yields no ranges.
pub fn split_range(count: usize, nsplit: usize) -> Vec<(usize, usize)> {
    if nsplit == 0 {
        return Vec::new();
    }
    let range = std::cmp::max(1, count / nsplit);
    let mut result = Vec::with_capacity(nsplit);
    let mut current = 0;
    for i in 0..nsplit {
        if current >= count {
            break;
        }
        if i + 1 == nsplit {
            result.push((current, count - current));
        } else {
            result.push((current, range.min(count - current)));
            current += range;
        }
    }
    result
}

/// Group `records` using up to `workers` threads.
///
/// Partitions are contiguous slices of the input, so records keep their
/// input order within each merged batch. `normalize` has the same meaning
/// as in [`group_by_destination`].
pub fn group_partitioned(
    records: Vec<Record>,
    workers: usize,
    normalize: bool,
) -> Result<Vec<RecordBatch>> {
    let ranges = split_range(records.len(), workers);
    if ranges.len() <= 1 {
        return group_by_destination(records, normalize);
    }

    let mut remaining = records.into_iter();
    let partitions: Vec<Vec<Record>> = ranges
        .iter()
        .map(|&(_, len)| remaining.by_ref().take(len).collect())
        .collect();
    debug!(partitions = partitions.len(), "grouping partitions concurrently");

    let grouped: Vec<Result<Vec<RecordBatch>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .into_iter()
            .map(|partition| scope.spawn(move || group_by_destination(partition, normalize)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });

    let collections = grouped.into_iter().collect::<Result<Vec<_>>>()?;
    Ok(merge_batches(collections))
}
