//! Similarity threshold.

use crate::error::CompareError;

/// Largest meaningful distance between two 64-bit fingerprints
pub const MAX_DISTANCE: u32 = 64;

/// Maximum Hamming distance at which two images count as similar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdStrategy {
    threshold: u32,
}

impl ThresholdStrategy {
    /// Create a threshold strategy.
    ///
    /// Recommended thresholds:
    /// - 5: Conservative, few false positives
    /// - 8: Balanced (default)
    /// - 10: Permissive, catches more near-duplicates
    pub fn new(threshold: u32) -> Result<Self, CompareError> {
        if threshold > MAX_DISTANCE {
            return Err(CompareError::InvalidThreshold { value: threshold });
        }
        Ok(Self { threshold })
    }

    /// Determine if two fingerprints are similar based on distance
    pub fn is_match(&self, distance: u32) -> bool {
        distance <= self.threshold
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self { threshold: 8 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_at_boundary() {
        let strategy = ThresholdStrategy::new(5).unwrap();

        assert!(strategy.is_match(4));
        assert!(strategy.is_match(5));
        assert!(!strategy.is_match(6));
    }

    #[test]
    fn full_range_is_accepted() {
        assert!(ThresholdStrategy::new(0).is_ok());
        assert!(ThresholdStrategy::new(64).unwrap().is_match(64));
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(matches!(
            ThresholdStrategy::new(65),
            Err(CompareError::InvalidThreshold { value: 65 })
        ));
    }

    #[test]
    fn default_is_balanced() {
        assert_eq!(ThresholdStrategy::default().threshold(), 8);
    }
}
