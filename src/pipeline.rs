//! Named pipeline stages and label encoding.
//!
//! The training workflow runs as a fixed sequence of named stages, each
//! announced and timed on the console, rather than as a chain of opaque
//! transform objects. [`LabelCodec`] is the one stateful piece: it maps the
//! folder-name labels it sees during fitting to dense indices and back.

use std::collections::HashMap;
use std::time::Instant;

use colored::Colorize;
use tracing::info;

use crate::error::{GalleryError, Result};

/// The stages of the training workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadImages,
    ShuffleAndSplit,
    MapLabels,
    Preprocess,
    Train,
    Evaluate,
    SaveModel,
    CopyModel,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::LoadImages => "load-images",
            Stage::ShuffleAndSplit => "shuffle-and-split",
            Stage::MapLabels => "map-labels",
            Stage::Preprocess => "preprocess",
            Stage::Train => "train",
            Stage::Evaluate => "evaluate",
            Stage::SaveModel => "save-model",
            Stage::CopyModel => "copy-model",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Announces a stage and reports its wall-clock duration when dropped via
/// [`StageTimer::finish`].
pub struct StageTimer {
    stage: Stage,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: Stage) -> Self {
        println!("{} {}", "==>".cyan().bold(), stage.name().bold());
        info!(stage = stage.name(), "stage started");
        Self {
            stage,
            started: Instant::now(),
        }
    }

    pub fn finish(self) {
        let elapsed = self.started.elapsed();
        println!(
            "    {} {} in {:.2?}",
            "done".green(),
            self.stage.name(),
            elapsed
        );
        info!(stage = self.stage.name(), ?elapsed, "stage finished");
    }
}

/// Bidirectional label map: folder-name labels to dense indices.
///
/// Fitting assigns indices in first-seen order over the records it is given,
/// mirroring how the key mapping is built from the (already shuffled)
/// training subset.
#[derive(Debug, Clone, Default)]
pub struct LabelCodec {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelCodec {
    /// Build a codec over the labels in `records`, in first-seen order.
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut codec = Self::default();
        for label in labels {
            if !codec.index.contains_key(label) {
                codec.index.insert(label.to_string(), codec.labels.len());
                codec.labels.push(label.to_string());
            }
        }
        codec
    }

    /// Rebuild from a stored label list, preserving its order.
    pub fn from_labels(labels: Vec<String>) -> Self {
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, index }
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| GalleryError::Dataset(format!("Unknown label '{}'", label)))
    }

    pub fn decode(&self, index: usize) -> Result<&str> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| GalleryError::Dataset(format!("Label index {} out of range", index)))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
