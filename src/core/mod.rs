//! # Core Module
//!
//! The duplicate detection engine.
//!
//! ## Modules
//! - `scanner` - Probes candidate files and recognizes image formats
//! - `exact` - Finds byte-identical files through size buckets and digests
//! - `hasher` - Computes perceptual hashes of images
//! - `comparator` - Clusters similar fingerprints into groups
//! - `pipeline` - Orchestrates the full workflow

pub mod comparator;
pub mod exact;
pub mod hasher;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use comparator::{DuplicateGroup, GroupKind};
pub use hasher::{hamming_distance, DHash};
pub use pipeline::{CancellationToken, DuplicatePipeline, ScanOptions, ScanOutcome, ScanReport};
pub use scanner::FileEntry;
