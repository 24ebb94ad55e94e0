//! # Exact Module
//!
//! Finds byte-identical files.
//!
//! ## Stages
//! 1. **Size buckets** - files of different length can never be identical
//! 2. **Prefix check** - in buckets of files larger than 4 KiB, split by a
//!    fast hash of the first 4 KiB
//! 3. **Content digest** - SHA-256 over the whole file, streamed in 64 KiB
//!    chunks, grouped by digest
//!
//! Each stage only discards files that cannot have an identical partner,
//! so no true duplicate is ever lost.

mod content;
mod matcher;

pub use content::{ContentDigest, ContentHasher, CHUNK_SIZE, PREFIX_LEN};
pub use matcher::{BucketOutcome, ExactHashMatcher};

use crate::core::scanner::FileEntry;
use std::collections::HashMap;

/// Files sharing one exact byte length
#[derive(Debug, Clone)]
pub struct SizeBucket {
    pub size: u64,
    pub files: Vec<FileEntry>,
}

impl SizeBucket {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Partition entries by size, keeping buckets of two or more files.
///
/// Files smaller than `min_size` are left out. Buckets come largest size
/// first; members keep their input order.
pub fn bucket_by_size(entries: &[FileEntry], min_size: u64) -> Vec<SizeBucket> {
    let mut by_size: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    for entry in entries.iter().filter(|e| e.size() >= min_size) {
        by_size.entry(entry.size()).or_default().push(entry.clone());
    }

    let mut buckets: Vec<SizeBucket> = by_size
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(size, files)| SizeBucket { size, files })
        .collect();
    buckets.sort_by(|a, b| b.size.cmp(&a.size));
    buckets
}
