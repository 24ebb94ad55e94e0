//! Scan configuration.

use crate::core::comparator::ThresholdStrategy;
use crate::core::scanner::ImageFilter;
use crate::error::DuplicateFinderError;
use serde::{Deserialize, Serialize};

/// Options controlling which detection branches run and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Whether the caller expanded directories recursively. Informational.
    pub recursive: bool,
    /// Run the byte-identical branch
    pub enable_hash_scan: bool,
    /// Run the perceptual image branch
    pub enable_image_scan: bool,
    /// Maximum Hamming distance for two images to count as similar (0-64)
    pub threshold: u32,
    /// Extensions treated as images; `None` uses the built-in set
    pub image_extensions: Option<Vec<String>>,
    /// Files smaller than this are left out of the exact branch
    pub min_size: u64,
    /// Worker threads; `None` lets rayon decide
    pub threads: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            enable_hash_scan: true,
            enable_image_scan: true,
            threshold: 8,
            image_extensions: None,
            min_size: 0,
            threads: None,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn hash_scan(mut self, enabled: bool) -> Self {
        self.enable_hash_scan = enabled;
        self
    }

    pub fn image_scan(mut self, enabled: bool) -> Self {
        self.enable_image_scan = enabled;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn image_extensions(mut self, extensions: Vec<String>) -> Self {
        self.image_extensions = Some(extensions);
        self
    }

    pub fn min_size(mut self, bytes: u64) -> Self {
        self.min_size = bytes;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<(), DuplicateFinderError> {
        ThresholdStrategy::new(self.threshold)?;
        if self.threads == Some(0) {
            return Err(DuplicateFinderError::Config(
                "thread count must be at least 1".to_string(),
            ));
        }
        if matches!(&self.image_extensions, Some(exts) if exts.is_empty()) {
            return Err(DuplicateFinderError::Config(
                "image extension list is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Extension filter for the image branch
    pub fn image_filter(&self) -> ImageFilter {
        match &self.image_extensions {
            Some(exts) => ImageFilter::new().with_extensions(exts.clone()),
            None => ImageFilter::default(),
        }
    }
}
