//! Fingerprint values and Hamming distance.

use crate::core::scanner::FileEntry;
use serde::{Deserialize, Serialize};

/// Number of differing bits between two 64-bit values
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// A 64-bit difference hash.
///
/// Bit 63 is row 0, column 0 of the comparison grid; bits follow row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DHash(u64);

impl DHash {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw 64-bit value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Hamming distance to another hash, in `0..=64`.
    ///
    /// Lower distance = more similar images.
    pub fn distance(&self, other: &Self) -> u32 {
        hamming_distance(self.0, other.0)
    }
}

/// An image accepted into the similarity pool
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub entry: FileEntry,
    pub hash: DHash,
}

impl Fingerprint {
    pub fn new(entry: FileEntry, hash: DHash) -> Self {
        Self { entry, hash }
    }
}
