use cloudless_core::TrainingExample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Class balance and size figures of one preparation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreparationStatistics {
    /// Annotated images read from the metadata.
    pub raw_input_images: usize,
    /// Examples produced by cropping, before the split.
    pub generated_examples: usize,
    /// Cloud examples in the training set.
    pub positive: usize,
    /// Clear examples in the training set.
    pub negative: usize,
    /// `min(positive, negative) / max(positive, negative)`, 0 when both are 0.
    pub ratio: f64,
    /// Training examples including augmented copies.
    pub total_training: usize,
    pub validation: usize,
    pub augmented: bool,
    pub balanced: bool,
}

/// Minority over majority class count.
pub fn imbalance_ratio(positive: usize, negative: usize) -> f64 {
    let (lo, hi) = (positive.min(negative), positive.max(negative));
    if hi == 0 {
        0.0
    } else {
        lo as f64 / hi as f64
    }
}

impl PreparationStatistics {
    pub fn new(
        raw_input_images: usize,
        generated_examples: usize,
        train: &[TrainingExample],
        validation: usize,
        augmented: bool,
        balanced: bool,
    ) -> Self {
        let positive = train.iter().filter(|e| e.target.is_cloud()).count();
        let negative = train.len() - positive;
        Self {
            raw_input_images,
            generated_examples,
            positive,
            negative,
            ratio: imbalance_ratio(positive, negative),
            total_training: train.len(),
            validation,
            augmented,
            balanced,
        }
    }

    /// Write the human-readable report to `path`.
    pub fn write_report(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_string())
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl fmt::Display for PreparationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input data details during data preparation:")?;
        writeln!(
            f,
            "  Total # of raw input images for training/validation: {}",
            self.raw_input_images
        )?;
        writeln!(
            f,
            "  Total # of generated bounding box images for training/validation: {}",
            self.generated_examples
        )?;
        writeln!(
            f,
            "  Positive cloud count (# of images with clouds) in training data: {}",
            self.positive
        )?;
        writeln!(
            f,
            "  Negative cloud count (# of images without clouds) in training data: {}",
            self.negative
        )?;
        writeln!(f, "  Ratio: {:.2}", self.ratio)?;
        writeln!(
            f,
            "  Total # of input images including data augmentation: {}",
            self.total_training
        )?;
        writeln!(f, "  Validation images: {}", self.validation)?;
        writeln!(f, "  Balanced classes: {}", yes_no(self.balanced))?;
        writeln!(f, "  Data augmentation: {}", yes_no(self.augmented))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cloudless_core::Target;

    #[test]
    fn ratio_is_minority_over_majority() {
        assert_relative_eq!(imbalance_ratio(3, 12), 0.25);
        assert_relative_eq!(imbalance_ratio(12, 3), 0.25);
        assert_relative_eq!(imbalance_ratio(5, 5), 1.0);
        assert_relative_eq!(imbalance_ratio(0, 4), 0.0);
        assert_relative_eq!(imbalance_ratio(0, 0), 0.0);
    }

    #[test]
    fn counts_classes_of_the_training_set() {
        let train = vec![
            TrainingExample::new("a", Target::Cloud),
            TrainingExample::new("b", Target::Clear),
            TrainingExample::new("c", Target::Clear),
            TrainingExample::new("d", Target::Clear),
        ];
        let stats = PreparationStatistics::new(3, 5, &train, 1, false, false);
        assert_eq!(stats.positive, 1);
        assert_eq!(stats.negative, 3);
        assert_eq!(stats.total_training, 4);
        assert_relative_eq!(stats.ratio, 1.0 / 3.0);

        let report = stats.to_string();
        assert!(report.contains("Ratio: 0.33"));
        assert!(report.contains("Data augmentation: no"));
        assert!(report.contains("raw input images for training/validation: 3"));
    }
}
