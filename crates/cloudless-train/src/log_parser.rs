//! Parsing of the tab-separated series derived from a trainer log.
//!
//! Each data row holds at least five columns: iteration, seconds, learning
//! rate, accuracy, loss. Header rows contain `Iters` and are skipped, as are
//! blank rows.

use crate::TrainError;
use cloudless_core::LogPaths;
use csv::StringRecord;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One evaluation point of a training run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogSample {
    pub iteration: u64,
    pub loss: f64,
    pub accuracy: f64,
}

/// Samples in file order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSeries {
    pub samples: Vec<LogSample>,
}

impl LogSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iterations(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.iteration).collect()
    }

    pub fn losses(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.loss).collect()
    }

    pub fn accuracies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.accuracy).collect()
    }

    pub fn last(&self) -> Option<&LogSample> {
        self.samples.last()
    }
}

const ITERATION_COL: usize = 0;
const ACCURACY_COL: usize = 3;
const LOSS_COL: usize = 4;

fn parse_row(row: &StringRecord) -> Result<LogSample, String> {
    if row.len() <= LOSS_COL {
        return Err(format!("expected at least {} columns, got {}", LOSS_COL + 1, row.len()));
    }
    let number = |idx: usize| {
        let field = &row[idx];
        field
            .parse::<f64>()
            .map_err(|_| format!("column {idx} is not a number: {field:?}"))
    };
    let iteration = number(ITERATION_COL)?;
    if !iteration.is_finite() || iteration < 0.0 {
        return Err(format!("invalid iteration {iteration}"));
    }
    Ok(LogSample {
        // Iterations are written as floats; truncate like int(float(x)).
        iteration: iteration.trunc() as u64,
        accuracy: number(ACCURACY_COL)?,
        loss: number(LOSS_COL)?,
    })
}

/// Parse one series. Malformed rows are logged and skipped.
pub fn parse_series(text: &str) -> LogSeries {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut samples = Vec::new();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping unreadable log row: {e}");
                continue;
            }
        };
        if row.iter().all(str::is_empty) || row.iter().any(|f| f.contains("Iters")) {
            continue;
        }
        match parse_row(&row) {
            Ok(sample) => samples.push(sample),
            Err(why) => {
                let line = row.position().map(|p| p.line()).unwrap_or_default();
                warn!("skipping log row {line}: {why}");
            }
        }
    }
    LogSeries { samples }
}

fn read_series(path: &Path) -> Result<LogSeries, TrainError> {
    let text = std::fs::read_to_string(path).map_err(|source| TrainError::ReadLog {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_series(&text))
}

/// Read `<log>.train` and `<log>.validate` next to `log_file`.
pub fn parse_logs(log_file: impl AsRef<Path>) -> Result<(LogSeries, LogSeries), TrainError> {
    let log_file = log_file.as_ref();
    let sibling = |suffix: &str| {
        let mut raw = log_file.as_os_str().to_os_string();
        raw.push(suffix);
        std::path::PathBuf::from(raw)
    };
    Ok((
        read_series(&sibling(".train"))?,
        read_series(&sibling(".validate"))?,
    ))
}

/// [`parse_logs`] for a numbered run.
pub fn parse_run_logs(paths: &LogPaths) -> Result<(LogSeries, LogSeries), TrainError> {
    Ok((
        read_series(&paths.train_log())?,
        read_series(&paths.validate_log())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TRAIN: &str = "Iters\tSeconds\t\tLR\taccuracy\tloss\n\
        0.0\t5.2\t0.001\t0.5\t0.693\n\
        \x20 20.0\t   9.9\t0.001\t0.55\t0.61\n\
        \n\
        40\t14.1\t0.001\t0.75\t0.402\n";

    #[test]
    fn reads_iteration_accuracy_and_loss() {
        let series = parse_series(TRAIN);
        assert_eq!(series.iterations(), vec![0, 20, 40]);
        assert_relative_eq!(series.accuracies()[1], 0.55);
        assert_relative_eq!(series.losses()[2], 0.402);
        assert_eq!(series.last().map(|s| s.iteration), Some(40));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let text = "10\t1\t0.1\t0.5\n\
                    20\t1\t0.1\tabc\t0.3\n\
                    -5\t1\t0.1\t0.5\t0.3\n\
                    30.9\t1\t0.1\t0.9\t0.1\n";
        let series = parse_series(text);
        assert_eq!(series.iterations(), vec![30]);
    }

    #[test]
    fn header_only_gives_empty_series() {
        assert!(parse_series("NumIters,Seconds\nIters\tSeconds\n").is_empty());
    }
}
