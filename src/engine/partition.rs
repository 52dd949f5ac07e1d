//! Splits the input list into contiguous per-worker chunks

use crate::engine::types::{ChunkAssignment, WorkItem};
use std::ops::Range;

/// Computes the index range each worker owns
///
/// Every chunk holds `ceil(len / workers)` items except the last non-empty
/// one, which holds the remainder. Chunks past the end of the list are empty.
/// A worker count of zero is treated as one.
pub fn chunk_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let chunk_size = len.div_ceil(workers);

    (0..workers)
        .map(|index| {
            let start = (index * chunk_size).min(len);
            let end = (start + chunk_size).min(len);
            start..end
        })
        .collect()
}

/// Partitions `items` into exactly `workers` ordered assignments
///
/// Concatenating the assignments in worker-id order reproduces `items`.
pub fn partition(items: Vec<WorkItem>, workers: usize) -> Vec<ChunkAssignment> {
    let ranges = chunk_ranges(items.len(), workers);
    let mut remaining = items.into_iter();

    ranges
        .into_iter()
        .enumerate()
        .map(|(worker_id, range)| ChunkAssignment {
            worker_id,
            items: remaining.by_ref().take(range.len()).collect(),
        })
        .collect()
}
