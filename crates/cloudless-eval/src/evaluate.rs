use crate::{CloudModel, ConfusionMatrix, EvalError, EvaluationReport};
use cloudless_core::{LogPaths, Target};
use cloudless_records::RecordStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalParams {
    pub validation_store: PathBuf,
    /// Cloud is predicted iff the probability is at least this.
    pub threshold: f64,
    pub log_dir: PathBuf,
    pub log_num: u32,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            validation_store: PathBuf::from("data/leveldb/validation_leveldb"),
            threshold: 0.5,
            log_dir: PathBuf::from("logs"),
            log_num: 1,
        }
    }
}

impl EvalParams {
    pub fn log_paths(&self) -> LogPaths {
        LogPaths::new(&self.log_dir, self.log_num)
    }
}

fn check_threshold(threshold: f64) -> Result<(), EvalError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(EvalError::InvalidThreshold(threshold))
    }
}

/// Score every record of `store` and count the outcomes.
///
/// Records that do not decode to an RGB image are warned about and left out
/// of the counts; their number is returned alongside the matrix. Model
/// failures abort the pass.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(threshold = threshold))
)]
pub fn evaluate_store(
    store: impl AsRef<Path>,
    mut model: impl CloudModel,
    threshold: f64,
) -> Result<(ConfusionMatrix, usize), EvalError> {
    check_threshold(threshold)?;
    let mut store = RecordStore::open(store)?;
    let records = store.records()?;
    info!(
        "scoring {} validation records from {}",
        records.len(),
        store.path().display()
    );

    let mut matrix = ConfusionMatrix::default();
    let mut skipped = 0usize;
    for record in &records {
        let image = match record.datum.to_rgb_image() {
            Ok(image) => image,
            Err(e) => {
                warn!("skipping record {}: {e}", record.key);
                skipped += 1;
                continue;
            }
        };
        let probability = model.cloud_probability(&image)?;
        let predicted = if probability >= threshold {
            Target::Cloud
        } else {
            Target::Clear
        };
        matrix.record(record.datum.target(), predicted);
    }
    Ok((matrix, skipped))
}

/// [`evaluate_store`] without the skip count.
pub fn evaluate(
    store: impl AsRef<Path>,
    model: impl CloudModel,
    threshold: f64,
) -> Result<ConfusionMatrix, EvalError> {
    evaluate_store(store, model, threshold).map(|(matrix, _)| matrix)
}

/// Evaluate the configured store and write `<prefix>.statistics.txt` and
/// `<prefix>.statistics.json`.
pub fn run_evaluation(
    params: &EvalParams,
    model: impl CloudModel,
) -> Result<EvaluationReport, EvalError> {
    let (matrix, skipped) = evaluate_store(&params.validation_store, model, params.threshold)?;
    let report = EvaluationReport::new(params.threshold, matrix, skipped);

    let paths = params.log_paths();
    let text_path = paths.evaluation_statistics();
    if let Some(parent) = text_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&text_path, report.to_string())?;
    fs::write(paths.with_suffix(".statistics.json"), report.to_json()?)?;
    info!("{report}");
    info!("evaluation statistics saved to {}", text_path.display());
    Ok(report)
}
