//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Converting to grayscale
//! 2. Resizing the image to 9 x 8 with a bilinear filter
//! 3. Comparing each pixel to the one to its right
//! 4. If left pixel is brighter, set bit to 1, else 0
//!
//! This captures the relative gradient of brightness changes. It survives
//! re-encoding and rescaling but not mirroring or rotation.

use super::fast_decode::FastDecoder;
use super::fast_resize::FastResizer;
use super::fingerprint::DHash;
use crate::error::HashError;
use image::DynamicImage;
use std::path::Path;

/// Comparison grid width (one extra column for the right-hand neighbor)
const GRID_WIDTH: u32 = 9;
/// Comparison grid height
const GRID_HEIGHT: u32 = 8;

/// Difference Hash (dHash) implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct DifferenceHasher;

impl DifferenceHasher {
    pub fn new() -> Self {
        Self
    }

    /// Compute a hash from an already-loaded image
    pub fn hash_image(&self, image: &DynamicImage) -> Result<DHash, HashError> {
        let mut resizer = FastResizer::new();
        let gray = resizer.resize_to_grayscale(image, GRID_WIDTH, GRID_HEIGHT)?;

        let mut bits: u64 = 0;
        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH - 1 {
                let left_pixel = gray.get_pixel(x, y)[0];
                let right_pixel = gray.get_pixel(x + 1, y)[0];

                bits <<= 1;
                if left_pixel > right_pixel {
                    bits |= 1;
                }
            }
        }

        Ok(DHash::new(bits))
    }

    /// Decode a file and hash it.
    ///
    /// Any decode or resize failure carries the file's path.
    pub fn hash_file(&self, path: &Path) -> Result<DHash, HashError> {
        let image = FastDecoder::decode(path)?;
        self.hash_image(&image).map_err(|e| e.with_path(path))
    }
}
