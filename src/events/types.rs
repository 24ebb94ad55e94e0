//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the duplicate pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Per-file progress within a phase
    Progress(FileProgress),
    /// A file was dropped from a phase but the scan continues
    Skipped(SkippedFile),
    /// Similarity comparison events
    Compare(CompareEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Progress information for one processed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProgress {
    /// Phase the file was processed in
    pub phase: PipelinePhase,
    /// Files processed so far in this phase
    pub completed: usize,
    /// Total files this phase will process
    pub total: usize,
    /// The file just processed
    pub current_path: PathBuf,
}

/// A file that could not be processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub phase: PipelinePhase,
    pub path: PathBuf,
    pub message: String,
}

/// Events during the similarity comparison phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started { pool_size: usize },
    /// Progress update during comparison
    Progress(CompareProgress),
    /// Comparison completed
    Completed { total_groups: usize },
}

/// Progress information during comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Pool rows whose pairs have been compared
    pub rows_completed: usize,
    /// Rows in the pool
    pub total_rows: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started { total_candidates: usize },
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled
    Cancelled,
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    /// Probing candidate paths for size and modification time
    Collecting,
    /// Hashing file content inside size buckets
    ExactHashing,
    /// Computing perceptual fingerprints of images
    Fingerprinting,
    /// Clustering fingerprints
    Clustering,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Candidate files that could be probed
    pub files_considered: usize,
    /// Groups of byte-identical files
    pub hash_groups: usize,
    /// Groups of visually similar images
    pub similar_groups: usize,
    /// Bytes freed by keeping one file per group
    pub reclaimable_bytes: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Collecting => write!(f, "Collecting"),
            PipelinePhase::ExactHashing => write!(f, "Hashing"),
            PipelinePhase::Fingerprinting => write!(f, "Fingerprinting"),
            PipelinePhase::Clustering => write!(f, "Clustering"),
        }
    }
}
