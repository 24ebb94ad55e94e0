//! # Hasher Module
//!
//! Computes perceptual fingerprints for images.
//!
//! ## How It Works
//! 1. Decode the image (zune-jpeg for JPEG, image crate otherwise)
//! 2. Convert to grayscale and resize to a 9x8 grid
//! 3. Set one bit per horizontal neighbor pair: left brighter than right
//! 4. Compare fingerprints using Hamming distance
//!
//! ## Example
//! ```rust,ignore
//! use duplicate_finder::core::hasher::DifferenceHasher;
//!
//! let a = DifferenceHasher::new().hash_file(&path_a)?;
//! let b = DifferenceHasher::new().hash_file(&path_b)?;
//! println!("{} bits apart", a.distance(&b));
//! ```

mod difference;
pub mod fast_decode;
pub mod fast_resize;
mod fingerprint;
pub mod mmap_decode;

pub use difference::DifferenceHasher;
pub use fingerprint::{hamming_distance, DHash, Fingerprint};
