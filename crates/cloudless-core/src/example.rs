use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Binary classification target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// No cloud in the image (label 0).
    Clear,
    /// At least one cloud (label 1).
    Cloud,
}

impl Target {
    /// Integer label stored in training records.
    #[inline]
    pub fn label(self) -> i32 {
        match self {
            Target::Clear => 0,
            Target::Cloud => 1,
        }
    }

    /// Inverse of [`Target::label`]; any non-zero label is a cloud.
    #[inline]
    pub fn from_label(label: i32) -> Self {
        if label == 0 {
            Target::Clear
        } else {
            Target::Cloud
        }
    }

    #[inline]
    pub fn is_cloud(self) -> bool {
        self == Target::Cloud
    }
}

/// An image from the annotation store with its cloud bounding boxes.
///
/// An empty box list marks a negative (clear) image; every box of a positive
/// image becomes its own training example.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedImage {
    pub image_name: String,
    pub image_path: PathBuf,
    pub boxes: Vec<BoundingBox>,
}

impl AnnotatedImage {
    pub fn target(&self) -> Target {
        if self.boxes.is_empty() {
            Target::Clear
        } else {
            Target::Cloud
        }
    }
}

/// A materialized image on disk with its target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingExample {
    pub path: PathBuf,
    pub target: Target,
}

impl TrainingExample {
    pub fn new(path: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            path: path.into(),
            target,
        }
    }
}
