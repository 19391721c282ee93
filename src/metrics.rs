//! Multiclass evaluation metrics.
//!
//! Accuracy, log-loss, per-class precision/recall/F1 and a confusion
//! matrix, computed from encoded predictions against encoded ground truth.

use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Floor applied to probabilities before taking the log, so a confidently
/// wrong prediction yields a large finite penalty instead of infinity.
const LOG_LOSS_EPSILON: f64 = 1e-15;

/// Evaluation results over a labeled set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Total number of samples evaluated
    pub total_samples: usize,
    /// Number of correct predictions
    pub correct_predictions: usize,
    /// Overall accuracy (correct / total)
    pub accuracy: f64,
    /// Mean negative log probability assigned to the true class
    pub log_loss: f64,
    /// Macro-averaged F1 over classes with support
    pub macro_f1: f64,
    /// Per-class metrics, indexed by encoded label
    pub per_class: Vec<ClassMetrics>,
    /// Confusion matrix (rows = actual, columns = predicted)
    pub confusion_matrix: ConfusionMatrix,
}

impl Metrics {
    /// Compute metrics from hard predictions.
    pub fn from_predictions(
        predictions: &[usize],
        ground_truth: &[usize],
        num_classes: usize,
    ) -> Self {
        assert_eq!(
            predictions.len(),
            ground_truth.len(),
            "Predictions and ground truth must have same length"
        );

        let total_samples = predictions.len();
        if total_samples == 0 {
            return Self::default();
        }

        let confusion_matrix =
            ConfusionMatrix::from_predictions(predictions, ground_truth, num_classes);
        let correct_predictions = confusion_matrix.correct();
        let accuracy = correct_predictions as f64 / total_samples as f64;

        let per_class: Vec<ClassMetrics> = (0..num_classes)
            .map(|class_idx| ClassMetrics::from_confusion_matrix(&confusion_matrix, class_idx))
            .collect();

        let supported: Vec<&ClassMetrics> = per_class.iter().filter(|m| m.support > 0).collect();
        let macro_f1 = if supported.is_empty() {
            0.0
        } else {
            supported.iter().map(|m| m.f1).sum::<f64>() / supported.len() as f64
        };

        Self {
            total_samples,
            correct_predictions,
            accuracy,
            log_loss: 0.0,
            macro_f1,
            per_class,
            confusion_matrix,
        }
    }

    /// Compute metrics from per-class probability rows, including log-loss.
    pub fn from_probabilities(
        probabilities: &[Vec<f32>],
        ground_truth: &[usize],
        num_classes: usize,
    ) -> Self {
        let predictions: Vec<usize> = probabilities.iter().map(|row| argmax(row)).collect();
        let mut metrics = Self::from_predictions(&predictions, ground_truth, num_classes);

        if !probabilities.is_empty() {
            let sum: f64 = probabilities
                .iter()
                .zip(ground_truth.iter())
                .map(|(row, &truth)| {
                    let p = row.get(truth).copied().unwrap_or(0.0) as f64;
                    -p.max(LOG_LOSS_EPSILON).ln()
                })
                .sum();
            metrics.log_loss = sum / probabilities.len() as f64;
        }

        metrics
    }

    /// Print a summary to console
    pub fn print(&self, class_labels: &[String]) {
        println!("\n{}", "Evaluation metrics:".bold());
        println!("  Accuracy: {:.2}%", self.accuracy * 100.0);
        println!("  Log-loss: {:.4}", self.log_loss);
        println!("  Macro F1: {:.4}", self.macro_f1);
        println!("  Samples:  {}", self.total_samples);
        for metrics in &self.per_class {
            let label = class_labels
                .get(metrics.class_idx)
                .map(String::as_str)
                .unwrap_or("?");
            println!(
                "    {:20} precision {:.2}  recall {:.2}  f1 {:.2}  ({} samples)",
                label, metrics.precision, metrics.recall, metrics.f1, metrics.support
            );
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            total_samples: 0,
            correct_predictions: 0,
            accuracy: 0.0,
            log_loss: 0.0,
            macro_f1: 0.0,
            per_class: Vec::new(),
            confusion_matrix: ConfusionMatrix::default(),
        }
    }
}

/// Index of the largest value in a probability row.
pub fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Per-class metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Encoded class index
    pub class_idx: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Precision = TP / (TP + FP)
    pub precision: f64,
    /// Recall = TP / (TP + FN)
    pub recall: f64,
    /// F1 = 2 * (precision * recall) / (precision + recall)
    pub f1: f64,
    /// Number of actual samples of this class
    pub support: usize,
}

impl ClassMetrics {
    pub fn from_confusion_matrix(cm: &ConfusionMatrix, class_idx: usize) -> Self {
        let true_positives = cm.get(class_idx, class_idx);
        let false_positives: usize = (0..cm.num_classes)
            .filter(|&i| i != class_idx)
            .map(|i| cm.get(i, class_idx))
            .sum();
        let false_negatives: usize = (0..cm.num_classes)
            .filter(|&i| i != class_idx)
            .map(|i| cm.get(class_idx, i))
            .sum();

        let support = true_positives + false_negatives;

        let precision = if true_positives + false_positives > 0 {
            true_positives as f64 / (true_positives + false_positives) as f64
        } else {
            0.0
        };
        let recall = if support > 0 {
            true_positives as f64 / support as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            class_idx,
            true_positives,
            false_positives,
            false_negatives,
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Confusion matrix stored as a flat row-major vector
/// (row = actual, column = predicted).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub num_classes: usize,
    pub matrix: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            matrix: vec![0; num_classes * num_classes],
        }
    }

    pub fn from_predictions(
        predictions: &[usize],
        ground_truth: &[usize],
        num_classes: usize,
    ) -> Self {
        let mut cm = Self::new(num_classes);
        for (&pred, &actual) in predictions.iter().zip(ground_truth.iter()) {
            cm.add(actual, pred);
        }
        cm
    }

    pub fn add(&mut self, actual: usize, predicted: usize) {
        if actual < self.num_classes && predicted < self.num_classes {
            self.matrix[actual * self.num_classes + predicted] += 1;
        }
    }

    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        if actual < self.num_classes && predicted < self.num_classes {
            self.matrix[actual * self.num_classes + predicted]
        } else {
            0
        }
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().sum()
    }

    /// Diagonal sum
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|i| self.get(i, i)).sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            self.correct() as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Running average of a scalar, for per-epoch loss tracking.
#[derive(Debug, Clone, Default)]
pub struct RunningAverage {
    sum: f64,
    count: usize,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn average(&self) -> f64 {
        if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }
}
