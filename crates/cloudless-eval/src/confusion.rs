use cloudless_core::Target;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary confusion counts with cloud as the positive class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

// Ratios with an empty denominator are reported as 0.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ConfusionMatrix {
    pub fn record(&mut self, expected: Target, predicted: Target) {
        match (expected.is_cloud(), predicted.is_cloud()) {
            (true, true) => self.true_positive += 1,
            (false, false) => self.true_negative += 1,
            (false, true) => self.false_positive += 1,
            (true, false) => self.false_negative += 1,
        }
    }

    pub fn actual_positive(&self) -> usize {
        self.true_positive + self.false_negative
    }

    pub fn actual_negative(&self) -> usize {
        self.true_negative + self.false_positive
    }

    pub fn total(&self) -> usize {
        self.actual_positive() + self.actual_negative()
    }

    /// Fraction of correct predictions.
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            accuracy: self.accuracy(),
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Outcome of a validation pass, as written to `<prefix>.statistics.txt`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub threshold: f64,
    pub matrix: ConfusionMatrix,
    pub metrics: Metrics,
    /// Records that could not be decoded or scored.
    pub skipped: usize,
}

impl EvaluationReport {
    pub fn new(threshold: f64, matrix: ConfusionMatrix, skipped: usize) -> Self {
        Self {
            threshold,
            matrix,
            metrics: matrix.metrics(),
            skipped,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.matrix;
        writeln!(
            f,
            "Statistics on validation dataset using threshold {:.6}:",
            self.threshold
        )?;
        writeln!(f, "\tAccuracy: {:.2}%", self.metrics.accuracy * 100.0)?;
        writeln!(f, "\tPrecision: {:.2}", self.metrics.precision)?;
        writeln!(f, "\tRecall: {:.2}", self.metrics.recall)?;
        writeln!(f, "\tF1 Score: {:.2}", self.metrics.f1)?;
        if self.skipped > 0 {
            writeln!(f, "\tSkipped records: {}", self.skipped)?;
        }
        writeln!(f)?;
        writeln!(f, "Confusion matrix:")?;
        writeln!(f, "\t\t\t\tPositive\t\tNegative")?;
        writeln!(
            f,
            "Positive ({})\t\t\tTrue Positive ({})\tFalse Positive ({})",
            m.actual_positive(),
            m.true_positive,
            m.false_positive
        )?;
        writeln!(
            f,
            "Negative ({})\t\t\tFalse Negative ({})\tTrue Negative ({})",
            m.actual_negative(),
            m.false_negative,
            m.true_negative
        )
    }
}
