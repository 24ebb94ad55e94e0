//! # Pipeline Module
//!
//! Orchestrates the full duplicate detection workflow.
//!
//! ## Pipeline Stages
//! 1. **Collect** - Probe candidate paths for size and modification time
//! 2. **Hash** - Bucket by size, then group byte-identical files by digest
//! 3. **Fingerprint** - Compute perceptual hashes of image files
//! 4. **Cluster** - Group fingerprints within the similarity threshold
//!
//! ## Parallelism
//! Uses rayon for per-file work, optionally on a dedicated thread pool.
//! Cancellation is cooperative and checked before every file and bucket.

mod cancel;
mod executor;
mod options;

pub use cancel::{CancellationToken, Cancelled};
pub use executor::{DuplicatePipeline, PipelineBuilder, ScanOutcome, ScanReport, ScanStats};
pub use options::ScanOptions;
