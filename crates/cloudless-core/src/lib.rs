//! Core types and utilities for the cloudless pipeline.
//!
//! This crate is intentionally small. It holds the typed records that flow
//! between pipeline stages (scenes, chunks, annotated images, training
//! examples) plus the logger and log-path helpers shared by every stage. It
//! does *not* depend on any image codec, network client or record store.

mod bbox;
mod example;
mod logger;
mod paths;
mod scene;

pub use bbox::{BoundingBox, BoundingBoxParseError};
pub use example::{AnnotatedImage, Target, TrainingExample};
pub use paths::{file_stem_and_ext, suffixed_file_name, LogPaths};
pub use scene::{Chunk, ProviderKind, Scene};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
