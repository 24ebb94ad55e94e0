//! # Band Index
//!
//! Candidate pair generation that skips most of the O(n²) pairwise pass.
//!
//! ## How It Works
//! 1. Split each 64-bit fingerprint into `bands` equal slices
//! 2. Bucket fingerprints by the value of each slice
//! 3. Two fingerprints sharing a bucket in ANY band are candidates
//!
//! ## Exactness
//! If two fingerprints differ in at most `bands - 1` bits, at least one band
//! is untouched by the differences (pigeonhole), so the pair shares a bucket.
//! For thresholds below the band count the candidates are therefore a
//! superset of the real matches, and clustering over candidates gives the
//! same groups as the exhaustive pass.

use crate::core::hasher::DHash;
use std::collections::HashMap;

/// Band value extracted from a fingerprint
type BandValue = u64;

/// Bucketed view of a fingerprint pool
pub struct BandIndex {
    bands: usize,
    bits_per_band: u32,
    /// band index -> (band value -> pool indices)
    band_tables: Vec<HashMap<BandValue, Vec<usize>>>,
    hashes: Vec<DHash>,
}

impl BandIndex {
    /// Band count used by the clusterer; exact for thresholds up to 7
    pub const DEFAULT_BANDS: usize = 8;

    /// Index a pool of fingerprints.
    ///
    /// `bands` must divide 64.
    pub fn build(hashes: &[DHash], bands: usize) -> Self {
        assert!(
            bands > 0 && 64 % bands == 0,
            "band count must divide 64, got {bands}"
        );
        let bits_per_band = (64 / bands) as u32;

        let mut index = Self {
            bands,
            bits_per_band,
            band_tables: (0..bands).map(|_| HashMap::new()).collect(),
            hashes: hashes.to_vec(),
        };

        for (idx, hash) in hashes.iter().enumerate() {
            for band in 0..bands {
                let value = index.band_value(*hash, band);
                index.band_tables[band].entry(value).or_default().push(idx);
            }
        }

        index
    }

    /// Whether candidates are guaranteed to include every pair within `threshold`
    pub fn covers(&self, threshold: u32) -> bool {
        (threshold as usize) < self.bands
    }

    /// Extract one band, counting from the most significant bits
    fn band_value(&self, hash: DHash, band: usize) -> BandValue {
        let shift = 64 - self.bits_per_band * (band as u32 + 1);
        let mask = if self.bits_per_band == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits_per_band) - 1
        };
        (hash.value() >> shift) & mask
    }

    /// Indices `j > i` sharing at least one band with entry `i`, ascending
    pub fn candidates_for(&self, i: usize) -> Vec<usize> {
        let hash = self.hashes[i];
        let mut candidates: Vec<usize> = (0..self.bands)
            .filter_map(|band| self.band_tables[band].get(&self.band_value(hash, band)))
            .flat_map(|bucket| bucket.iter().copied())
            .filter(|&j| j > i)
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }

    /// Number of indexed fingerprints
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(values: &[u64]) -> Vec<DHash> {
        values.iter().copied().map(DHash::new).collect()
    }

    #[test]
    fn empty_index() {
        let index = BandIndex::build(&[], BandIndex::DEFAULT_BANDS);
        assert!(index.is_empty());
    }

    #[test]
    fn single_fingerprint_no_candidates() {
        let index = BandIndex::build(&hashes(&[u64::MAX]), 8);
        assert!(index.candidates_for(0).is_empty());
    }

    #[test]
    fn identical_hashes_are_candidates() {
        let index = BandIndex::build(&hashes(&[0xAABB_CCDD, 0xAABB_CCDD, 0xAABB_CCDD]), 8);
        assert_eq!(index.candidates_for(0), vec![1, 2]);
        assert_eq!(index.candidates_for(1), vec![2]);
        assert!(index.candidates_for(2).is_empty());
    }

    #[test]
    fn seven_scattered_bits_still_collide() {
        // One flipped bit in each of seven different bands
        let a = 0u64;
        let b = (0..7).fold(0u64, |acc, band| acc | 1 << (band * 8));
        assert_eq!(DHash::new(a).distance(&DHash::new(b)), 7);

        let index = BandIndex::build(&hashes(&[a, b]), 8);
        assert_eq!(index.candidates_for(0), vec![1]);
        assert!(index.covers(7));
        assert!(!index.covers(8));
    }

    #[test]
    fn opposite_hashes_not_candidates() {
        let index = BandIndex::build(&hashes(&[u64::MAX, 0]), 8);
        assert!(index.candidates_for(0).is_empty());
    }

    #[test]
    fn single_band_is_exact_match_only() {
        let index = BandIndex::build(&hashes(&[5, 5, 4]), 1);
        assert_eq!(index.candidates_for(0), vec![1]);
        assert!(index.covers(0));
        assert!(!index.covers(1));
    }
}
