use crate::{
    copy_trained_weights, finalize_parsed_logs, parse_run_logs, LogSeries, SolverHyperparameters,
    TrainError, TrainerEnv,
};
use cloudless_core::LogPaths;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of a fine-tuning run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainParams {
    pub solver: PathBuf,
    /// Pre-trained weights to fine-tune from.
    pub input_weight_file: PathBuf,
    /// Where the final snapshot is copied.
    pub output_weight_file: PathBuf,
    pub log_dir: PathBuf,
    pub log_num: u32,
    /// Free-form note printed with the run caption.
    pub note: Option<String>,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            solver: PathBuf::from("src/caffe_model/bvlc_alexnet/solver.prototxt"),
            input_weight_file: PathBuf::from(
                "src/caffe_model/bvlc_alexnet/bvlc_alexnet.caffemodel",
            ),
            output_weight_file: PathBuf::from("logs/latest_bvlc_alexnet_finetuned.caffemodel"),
            log_dir: PathBuf::from("logs"),
            log_num: 1,
            note: None,
        }
    }
}

impl TrainParams {
    pub fn log_paths(&self) -> LogPaths {
        LogPaths::new(&self.log_dir, self.log_num)
    }
}

/// What a finished run left behind.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainOutcome {
    pub log_file: PathBuf,
    pub caption: Option<String>,
    pub training: LogSeries,
    pub validation: LogSeries,
    /// Snapshot the trainer wrote last, before it was copied.
    pub trained_weights: PathBuf,
    pub output_weight_file: PathBuf,
}

fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("stopped reading child output: {e}");
                    break;
                }
            }
        }
    })
}

/// Run `cmd`, copying every stdout and stderr line to `console` and to
/// `log_file` while the process runs.
///
/// Both streams feed one channel, so lines reach the consumer in the order
/// the reader threads see them. A non-zero exit is an error; the log is
/// complete either way.
pub fn run_command_logged(
    mut cmd: Command,
    log_file: &Path,
    console: &mut dyn Write,
) -> Result<(), TrainError> {
    let program = PathBuf::from(cmd.get_program());
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut log = File::create(log_file)?;

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| TrainError::Spawn {
            program: program.clone(),
            source,
        })?;

    let (tx, rx) = mpsc::channel();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(forward_lines(stderr, tx.clone()));
    }
    drop(tx);

    for line in rx {
        console.write_all(line.as_bytes())?;
        log.write_all(line.as_bytes())?;
    }
    for reader in readers {
        if reader.join().is_err() {
            warn!("output reader for {} panicked", program.display());
        }
    }
    console.flush()?;
    log.flush()?;

    let status = child.wait()?;
    if !status.success() {
        return Err(TrainError::Failed { program, status });
    }
    Ok(())
}

/// Spawn `caffe train` for `params`, logging to the run's log file.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn run_trainer(
    env: &TrainerEnv,
    params: &TrainParams,
    console: &mut dyn Write,
) -> Result<PathBuf, TrainError> {
    let log_file = params.log_paths().log_file();
    let mut solver_arg = std::ffi::OsString::from("--solver=");
    solver_arg.push(&params.solver);
    let mut weights_arg = std::ffi::OsString::from("--weights=");
    weights_arg.push(&params.input_weight_file);

    let mut cmd = Command::new(env.caffe_binary());
    cmd.arg("train").arg(solver_arg).arg(weights_arg);

    info!("running trainer, output goes to {}", log_file.display());
    run_command_logged(cmd, &log_file, console)?;
    info!("training output saved to {}", log_file.display());
    Ok(log_file)
}

/// Run `parse_log.py` over the run's log and normalize its outputs.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn generate_parsed_logs(
    env: &TrainerEnv,
    paths: &LogPaths,
    console: &mut dyn Write,
) -> Result<(), TrainError> {
    let mut cmd = Command::new(env.parse_log_script());
    cmd.arg(paths.log_file()).arg(paths.dir());
    // The script's chatter is kept next to the run, not mixed into its log.
    run_command_logged(cmd, &paths.with_suffix(".parse.log"), console)?;
    finalize_parsed_logs(paths)
}

/// Fine-tune, parse the logs and copy the final weights out.
pub fn train(env: &TrainerEnv, params: &TrainParams) -> Result<TrainOutcome, TrainError> {
    let paths = params.log_paths();
    let caption = match SolverHyperparameters::load(&params.solver) {
        Ok(hp) => Some(hp.caption(params.note.as_deref())),
        Err(e) => {
            warn!("no run caption: {e}");
            None
        }
    };
    if let Some(note) = &params.note {
        info!("details for this training run: {note}");
    }
    if let Some(caption) = &caption {
        info!("run {} {caption}", params.log_num);
    }

    let stdout = io::stdout();
    let mut console = stdout.lock();
    let log_file = run_trainer(env, params, &mut console)?;
    generate_parsed_logs(env, &paths, &mut console)?;
    let (training, validation) = parse_run_logs(&paths)?;
    let trained_weights = copy_trained_weights(&log_file, &params.output_weight_file)?;
    info!("finished training");

    Ok(TrainOutcome {
        log_file,
        caption,
        training,
        validation,
        trained_weights,
        output_weight_file: params.output_weight_file.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_alexnet_model() {
        let params: TrainParams = serde_json::from_str(r#"{"log_num": 4}"#).expect("json");
        assert_eq!(params.log_num, 4);
        assert_eq!(
            params.solver,
            PathBuf::from("src/caffe_model/bvlc_alexnet/solver.prototxt")
        );
        assert_eq!(
            params.log_paths().log_file(),
            PathBuf::from("logs/output0004.log")
        );
        assert!(params.note.is_none());
    }
}
