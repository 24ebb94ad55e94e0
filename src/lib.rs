//! # Duplicate Finder
//!
//! Finds byte-identical files and visually similar images.
//!
//! ## Core Philosophy
//! - **Never delete** - Report groups; acting on them is the caller's call
//! - **No false negatives** for identical content - cheap filters only ever
//!   discard files that cannot have an identical partner
//! - **Local failures stay local** - an unreadable file is skipped, the scan
//!   carries on
//!
//! ## Architecture
//! - `core` - The duplicate detection engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//!
//! ## Example
//! ```rust,no_run
//! use duplicate_finder::core::{DuplicatePipeline, ScanOptions};
//! use std::path::PathBuf;
//!
//! let pipeline = DuplicatePipeline::builder()
//!     .options(ScanOptions::new().threshold(6))
//!     .build()?;
//! let paths = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
//! if let Some(report) = pipeline.scan_paths(&paths)?.into_report() {
//!     for group in &report.groups {
//!         println!("{} group of {}", group.kind(), group.len());
//!     }
//! }
//! # Ok::<(), duplicate_finder::DuplicateFinderError>(())
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DuplicateFinderError, Result};

/// Initialize tracing for the library
///
/// `default_directive` applies when `RUST_LOG` is unset. Called by the
/// application entry point; a second call leaves the first subscriber in place.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
