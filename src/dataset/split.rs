//! Seeded shuffle and train/validation split.
//!
//! The whole record list is shuffled with a seeded RNG, then cut into a
//! training subset and a held-out validation subset. Both the shuffle and
//! the cut are deterministic for a given seed, so repeated runs see the
//! same partition.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::records::ImageRecord;
use crate::error::{GalleryError, Result};

/// The two subsets produced by [`TrainingDataset::shuffle_split`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDataset {
    /// Records used to fit the model
    pub train: Vec<ImageRecord>,
    /// Records held out for per-epoch evaluation
    pub validation: Vec<ImageRecord>,
    /// Seed the shuffle was performed with
    pub seed: u64,
    /// Validation fraction the cut was made at
    pub validation_fraction: f64,
}

impl TrainingDataset {
    /// Shuffle `records` with a ChaCha8 RNG seeded from `seed` and cut off
    /// `round(n * validation_fraction)` records as the validation subset.
    ///
    /// The validation subset is taken from the tail of the shuffled order,
    /// so the training subset keeps the head. Fails if the fraction is
    /// outside `[0, 1)` or if the cut would leave the training subset empty.
    pub fn shuffle_split(
        mut records: Vec<ImageRecord>,
        validation_fraction: f64,
        seed: u64,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&validation_fraction) {
            return Err(GalleryError::Config(format!(
                "Validation fraction must be in [0, 1), got {}",
                validation_fraction
            )));
        }
        if records.is_empty() {
            return Err(GalleryError::Dataset(
                "No images provided for splitting".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        records.shuffle(&mut rng);

        let n = records.len();
        let n_validation = (n as f64 * validation_fraction).round() as usize;
        if n_validation >= n {
            return Err(GalleryError::Dataset(format!(
                "Validation cut of {} leaves no training data (total {})",
                n_validation, n
            )));
        }

        let validation = records.split_off(n - n_validation);

        Ok(Self {
            train: records,
            validation,
            seed,
            validation_fraction,
        })
    }

    pub fn train_size(&self) -> usize {
        self.train.len()
    }

    pub fn validation_size(&self) -> usize {
        self.validation.len()
    }

    /// Print split sizes to console
    pub fn print(&self) {
        let total = self.train_size() + self.validation_size();
        println!("\nTrain/validation split (seed {}):", self.seed);
        println!(
            "  Training:   {} ({:.1}%)",
            self.train_size(),
            100.0 * self.train_size() as f64 / total as f64
        );
        println!(
            "  Validation: {} ({:.1}%)",
            self.validation_size(),
            100.0 * self.validation_size() as f64 / total as f64
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn create_test_records(n: usize) -> Vec<ImageRecord> {
        (0..n)
            .map(|i| ImageRecord::new(format!("photos/class_{}/img_{}.jpg", i % 5, i), format!("class_{}", i % 5)))
            .collect()
    }

    #[test]
    fn test_split_sizes_use_rounding() {
        // round(6 * 0.2) = 1, so a 6-image set splits 5/1
        let split = TrainingDataset::shuffle_split(create_test_records(6), 0.2, 1).unwrap();
        assert_eq!(split.train_size(), 5);
        assert_eq!(split.validation_size(), 1);

        // round(10 * 0.25) = 3 (round-half-away-from-zero)
        let split = TrainingDataset::shuffle_split(create_test_records(10), 0.25, 1).unwrap();
        assert_eq!(split.validation_size(), 3);
    }

    #[test]
    fn test_split_is_a_partition() {
        let records = create_test_records(50);
        let all: HashSet<PathBuf> = records.iter().map(|r| r.path.clone()).collect();

        let split = TrainingDataset::shuffle_split(records, 0.2, 7).unwrap();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for record in split.train.iter().chain(split.validation.iter()) {
            // No record appears in both subsets
            assert!(seen.insert(record.path.clone()));
        }
        assert_eq!(seen, all);
    }

    #[test]
    fn test_split_reproducibility() {
        let split1 = TrainingDataset::shuffle_split(create_test_records(40), 0.2, 42).unwrap();
        let split2 = TrainingDataset::shuffle_split(create_test_records(40), 0.2, 42).unwrap();
        assert_eq!(split1.train, split2.train);
        assert_eq!(split1.validation, split2.validation);
    }

    #[test]
    fn test_different_seed_different_order() {
        let split1 = TrainingDataset::shuffle_split(create_test_records(40), 0.2, 1).unwrap();
        let split2 = TrainingDataset::shuffle_split(create_test_records(40), 0.2, 2).unwrap();
        assert_ne!(split1.train, split2.train);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        assert!(TrainingDataset::shuffle_split(create_test_records(10), 1.0, 1).is_err());
        assert!(TrainingDataset::shuffle_split(create_test_records(10), -0.1, 1).is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            TrainingDataset::shuffle_split(Vec::new(), 0.2, 1),
            Err(GalleryError::Dataset(_))
        ));
    }
}
