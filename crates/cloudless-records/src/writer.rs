//! Batched packing of labelled images into a record store.

use crate::{record_key, Datum, RecordBatch, RecordError, RecordStore};
use cloudless_core::{Target, TrainingExample};
use image::imageops::FilterType;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters for [`RecordWriter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordWriterParams {
    /// Width every image is resized to.
    pub width: u32,
    /// Height every image is resized to.
    pub height: u32,
    /// Number of inputs per committed batch.
    pub commit_every: usize,
}

impl Default for RecordWriterParams {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            commit_every: 10_000,
        }
    }
}

/// Outcome of one [`RecordWriter::write`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Records stored.
    pub written: usize,
    /// Inputs that could not be loaded and were left out.
    pub skipped: Vec<PathBuf>,
    /// Batches committed, including the final partial one.
    pub batches: usize,
}

/// Writes `(image, target)` pairs into a freshly created record store.
#[derive(Clone, Debug)]
pub struct RecordWriter {
    params: RecordWriterParams,
}

impl RecordWriter {
    pub fn new(params: RecordWriterParams) -> Result<Self, RecordError> {
        if params.commit_every == 0 {
            return Err(RecordError::InvalidBatchSize);
        }
        if params.width == 0 || params.height == 0 {
            return Err(RecordError::InvalidSize {
                width: params.width,
                height: params.height,
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> RecordWriterParams {
        self.params
    }

    /// Pack `image_paths[i]` with `targets[i]` under key `record_key(i)`.
    ///
    /// Any existing store at `store_path` is deleted first. An image that
    /// fails to load is logged and skipped; its key stays unused so every
    /// other input keeps the key of its position.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(store = %store_path.as_ref().display(), n = image_paths.len()))
    )]
    pub fn write(
        &self,
        store_path: impl AsRef<Path>,
        image_paths: &[PathBuf],
        targets: &[Target],
    ) -> Result<WriteSummary, RecordError> {
        if image_paths.len() != targets.len() {
            return Err(RecordError::LengthMismatch {
                paths: image_paths.len(),
                targets: targets.len(),
            });
        }
        if image_paths.len() > crate::MAX_RECORDS {
            return Err(RecordError::KeyOverflow(image_paths.len() - 1));
        }

        let store_path = store_path.as_ref();
        info!("generating record store at {}", store_path.display());
        let mut store = RecordStore::create(store_path)?;
        let mut summary = WriteSummary::default();
        let mut batch = RecordBatch::new();
        let mut batch_started = Instant::now();

        for (idx, (path, &target)) in image_paths.iter().zip(targets).enumerate() {
            let key = record_key(idx)?;
            match self.load_datum(path, target) {
                Ok(datum) => {
                    batch.put(&key, &datum.to_bytes());
                    summary.written += 1;
                }
                Err(err) => {
                    warn!("unable to pack image {}: {err}", path.display());
                    summary.skipped.push(path.clone());
                }
            }

            if (idx + 1) % self.params.commit_every == 0 {
                store.commit(std::mem::take(&mut batch))?;
                summary.batches += 1;
                info!(
                    "wrote batch ending at key {key} in {} ms",
                    batch_started.elapsed().as_millis()
                );
                batch_started = Instant::now();
            }
        }

        if !batch.is_empty() {
            summary.batches += 1;
        }
        info!(
            "writing final batch of {} records, {} ms",
            batch.len(),
            batch_started.elapsed().as_millis()
        );
        store.commit(batch)?;
        store.flush()?;

        info!(
            "record store {} holds {} records ({} skipped)",
            store_path.display(),
            summary.written,
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Convenience wrapper over [`RecordWriter::write`] for typed examples.
    pub fn write_examples(
        &self,
        store_path: impl AsRef<Path>,
        examples: &[TrainingExample],
    ) -> Result<WriteSummary, RecordError> {
        let paths: Vec<PathBuf> = examples.iter().map(|e| e.path.clone()).collect();
        let targets: Vec<Target> = examples.iter().map(|e| e.target).collect();
        self.write(store_path, &paths, &targets)
    }

    fn load_datum(&self, path: &Path, target: Target) -> Result<Datum, RecordError> {
        let img = image::open(path)?
            .resize_exact(self.params.width, self.params.height, FilterType::Triangle)
            .to_rgb8();
        Ok(Datum::from_rgb(&img, target))
    }
}
