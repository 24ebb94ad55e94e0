//! # Comparator Module
//!
//! Duplicate groups and the similarity clusterer.
//!
//! ## How clustering works
//! 1. Compare fingerprint pairs using Hamming distance
//! 2. Union every pair within the threshold in a disjoint set
//! 3. Emit each connected component of two or more images as a group
//!
//! Grouping is a transitive closure: if A~B and B~C, {A, B, C} is one group
//! even when A and C are further apart than the threshold.
//!
//! ## Comparison Thresholds
//! | Distance | Typical meaning          |
//! |----------|--------------------------|
//! | 0        | Same picture             |
//! | 1-4      | Recompressed or resized  |
//! | 5-10     | Light edits              |
//! | 11+      | Different pictures       |

mod grouper;
mod lsh;
mod traits;
mod union_find;

pub use grouper::SimilarityClusterer;
pub use lsh::BandIndex;
pub use traits::ThresholdStrategy;
pub use union_find::DisjointSet;

use crate::core::scanner::FileEntry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the members of a group were matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    /// Byte-identical content
    Hash,
    /// Perceptually similar images
    Similar,
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Hash => write!(f, "Identical"),
            GroupKind::Similar => write!(f, "Similar"),
        }
    }
}

/// A set of two or more files considered duplicates of each other.
///
/// Built once by the matcher or clusterer that discovers it and read-only
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    id: Uuid,
    kind: GroupKind,
    files: Vec<FileEntry>,
    total_size: u64,
    distance: Option<u32>,
    digest: Option<String>,
}

impl DuplicateGroup {
    /// Group of byte-identical files sharing `digest`.
    ///
    /// Returns `None` for fewer than two files.
    pub fn exact(files: Vec<FileEntry>, digest: String) -> Option<Self> {
        Self::build(GroupKind::Hash, files, None, Some(digest))
    }

    /// Group of similar images whose widest pair is `distance` bits apart.
    ///
    /// Returns `None` for fewer than two files.
    pub fn similar(files: Vec<FileEntry>, distance: u32) -> Option<Self> {
        Self::build(GroupKind::Similar, files, Some(distance), None)
    }

    fn build(
        kind: GroupKind,
        mut files: Vec<FileEntry>,
        distance: Option<u32>,
        digest: Option<String>,
    ) -> Option<Self> {
        if files.len() < 2 {
            return None;
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path().cmp(b.path()));
        let total_size = files.iter().map(FileEntry::size).sum();

        Some(Self {
            id: Uuid::new_v4(),
            kind,
            files,
            total_size,
            distance,
            digest,
        })
    }

    /// Unique identifier for this group
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Members, sorted by path
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Sum of member sizes
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Maximum pairwise Hamming distance, only for similar groups
    pub fn distance(&self) -> Option<u32> {
        self.distance
    }

    /// Hex content digest, only for identical groups
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false: a group has at least two members.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of files beyond the one that would be kept
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes freed by keeping only the largest member
    pub fn reclaimable_bytes(&self) -> u64 {
        let largest = self.files.iter().map(FileEntry::size).max().unwrap_or(0);
        self.total_size - largest
    }
}
