//! Post-processing of a finished training run: parsed series files, the
//! trained weight file and solver hyperparameters.

use crate::TrainError;
use cloudless_core::LogPaths;
use log::info;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Tab-separate a comma-separated series and tidy its header.
///
/// Only the first line gets `NumIters` → `Iters` and `LearningRate` →
/// `\tLR`, which keeps the columns visually aligned.
pub fn normalize_parsed_log(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let line = line.replace(',', "\t");
        if idx == 0 {
            out.push_str(
                &line
                    .replace("NumIters", "Iters")
                    .replace("LearningRate", "\tLR"),
            );
        } else {
            out.push_str(&line);
        }
    }
    out
}

fn normalize_in_place(path: &Path) -> Result<(), TrainError> {
    let text = fs::read_to_string(path).map_err(|source| TrainError::ReadLog {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, normalize_parsed_log(&text))?;
    Ok(())
}

/// Turn the `parse_log.py` outputs of a run into the files [`crate::parse_logs`] reads.
///
/// `<log>.test` is renamed to `<log>.validate` (replacing any previous
/// one), then both series are normalized.
pub fn finalize_parsed_logs(paths: &LogPaths) -> Result<(), TrainError> {
    let test = paths.with_suffix(".log.test");
    let validate = paths.validate_log();
    match fs::remove_file(&validate) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }
    fs::rename(&test, &validate).map_err(|source| TrainError::ReadLog {
        path: test.clone(),
        source,
    })?;

    normalize_in_place(&paths.train_log())?;
    normalize_in_place(&validate)?;
    info!("parsed training log saved to {}", paths.train_log().display());
    info!("parsed validation log saved to {}", validate.display());
    Ok(())
}

// Not every trainer version prints "binary proto file".
static SNAPSHOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)Snapshotting to (?:binary proto file )?(.*)$").expect("snapshot pattern")
});
static BASE_LR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^base_lr:\s*([0-9.eE+-]+)\s*$").expect("base_lr pattern"));
static MAX_ITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^max_iter:\s*([0-9]+)\s*$").expect("max_iter pattern"));

/// Path of the last weight snapshot mentioned in a trainer log.
pub fn trained_weight_file(log_text: &str) -> Option<PathBuf> {
    SNAPSHOT
        .captures_iter(log_text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .last()
        .map(PathBuf::from)
}

/// Copy the final snapshot named in `log_file` to `dest`.
pub fn copy_trained_weights(log_file: &Path, dest: &Path) -> Result<PathBuf, TrainError> {
    let text = fs::read_to_string(log_file).map_err(|source| TrainError::ReadLog {
        path: log_file.to_path_buf(),
        source,
    })?;
    let weights =
        trained_weight_file(&text).ok_or_else(|| TrainError::MissingWeights(log_file.to_path_buf()))?;
    info!(
        "copying trained weight file from {} to {}",
        weights.display(),
        dest.display()
    );
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&weights, dest)?;
    Ok(weights)
}

/// Learning rate and iteration budget of a solver definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverHyperparameters {
    pub base_lr: String,
    pub max_iter: String,
}

impl SolverHyperparameters {
    pub fn parse(solver: &Path, text: &str) -> Result<Self, TrainError> {
        let field = |re: &Regex, name: &'static str| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or(TrainError::MissingSolverField {
                    path: solver.to_path_buf(),
                    field: name,
                })
        };
        Ok(Self {
            base_lr: field(&BASE_LR, "base_lr")?,
            max_iter: field(&MAX_ITER, "max_iter")?,
        })
    }

    pub fn load(solver: &Path) -> Result<Self, TrainError> {
        let text = fs::read_to_string(solver).map_err(|source| TrainError::ReadLog {
            path: solver.to_path_buf(),
            source,
        })?;
        Self::parse(solver, &text)
    }

    /// Run caption, e.g. `(lr: 0.001; max_iter: 1000; first try)`.
    pub fn caption(&self, note: Option<&str>) -> String {
        match note {
            Some(note) if !note.is_empty() => {
                format!("(lr: {}; max_iter: {}; {note})", self.base_lr, self.max_iter)
            }
            _ => format!("(lr: {}; max_iter: {})", self.base_lr, self.max_iter),
        }
    }
}
