//! Clusters perceptual fingerprints into similarity groups.
//!
//! Similarity is transitive: if A is within the threshold of B and B of C,
//! then {A, B, C} forms a single group even if A and C are further apart.

use super::{BandIndex, DisjointSet, DuplicateGroup, ThresholdStrategy};
use crate::core::hasher::{DHash, Fingerprint};
use crate::core::pipeline::{CancellationToken, Cancelled};
use crate::error::CompareError;
use crate::events::{CompareEvent, CompareProgress, Event, EventSender};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Rows compared between progress events
const PROGRESS_INTERVAL: usize = 256;

/// Groups fingerprints whose Hamming distance is within a threshold
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityClusterer {
    strategy: ThresholdStrategy,
}

impl SimilarityClusterer {
    pub fn new(threshold: u32) -> Result<Self, CompareError> {
        Ok(Self::with_strategy(ThresholdStrategy::new(threshold)?))
    }

    pub fn with_strategy(strategy: ThresholdStrategy) -> Self {
        Self { strategy }
    }

    pub fn threshold(&self) -> u32 {
        self.strategy.threshold()
    }

    /// Cluster `pool` into groups of two or more fingerprints.
    ///
    /// Each group's distance is the largest pairwise distance among its
    /// members, which may exceed the threshold through transitive links.
    pub fn cluster(
        &self,
        pool: Vec<Fingerprint>,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<Vec<DuplicateGroup>, Cancelled> {
        let n = pool.len();
        events.send(Event::Compare(CompareEvent::Started { pool_size: n }));
        if n < 2 {
            events.send(Event::Compare(CompareEvent::Completed { total_groups: 0 }));
            return Ok(Vec::new());
        }

        let hashes: Vec<DHash> = pool.iter().map(|f| f.hash).collect();
        let edges = self.matching_pairs(&hashes, cancel, events)?;
        tracing::debug!(pool = n, edges = edges.len(), "Pairwise comparison done");

        let mut sets = DisjointSet::new(n);
        for (a, b) in edges {
            sets.union(a, b);
        }

        let mut slots: Vec<Option<Fingerprint>> = pool.into_iter().map(Some).collect();
        let mut groups = Vec::new();
        for members in sets.components(2) {
            cancel.check()?;
            let distance = max_pairwise_distance(&members, &hashes);
            let files = members
                .iter()
                .filter_map(|&i| slots[i].take())
                .map(|f| f.entry)
                .collect();
            if let Some(group) = DuplicateGroup::similar(files, distance) {
                groups.push(group);
            }
        }

        events.send(Event::Compare(CompareEvent::Completed {
            total_groups: groups.len(),
        }));
        Ok(groups)
    }

    /// Every pair `(i, j)`, `i < j`, within the threshold.
    fn matching_pairs(
        &self,
        hashes: &[DHash],
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<Vec<(usize, usize)>, Cancelled> {
        let n = hashes.len();
        let index = BandIndex::build(hashes, BandIndex::DEFAULT_BANDS);
        let use_index = index.covers(self.threshold());
        if !use_index {
            tracing::debug!(
                threshold = self.threshold(),
                "Threshold beyond band index range, comparing all pairs"
            );
        }

        let rows_done = AtomicUsize::new(0);
        let rows: Vec<Option<Vec<(usize, usize)>>> = (0..n)
            .into_par_iter()
            .map(|i| {
                if cancel.is_cancelled() {
                    return None;
                }

                let within = |j: usize| self.strategy.is_match(hashes[i].distance(&hashes[j]));
                let pairs: Vec<(usize, usize)> = if use_index {
                    index
                        .candidates_for(i)
                        .into_iter()
                        .filter(|&j| within(j))
                        .map(|j| (i, j))
                        .collect()
                } else {
                    ((i + 1)..n)
                        .filter(|&j| within(j))
                        .map(|j| (i, j))
                        .collect()
                };

                let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_INTERVAL == 0 || done == n {
                    events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                        rows_completed: done,
                        total_rows: n,
                    })));
                }

                Some(pairs)
            })
            .collect();
        cancel.check()?;

        Ok(rows.into_iter().flatten().flatten().collect())
    }
}

fn max_pairwise_distance(members: &[usize], hashes: &[DHash]) -> u32 {
    let mut max = 0;
    for (k, &a) in members.iter().enumerate() {
        for &b in &members[k + 1..] {
            max = max.max(hashes[a].distance(&hashes[b]));
        }
    }
    max
}
