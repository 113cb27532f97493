//! Fine-tuning through the external Caffe trainer, and parsing of the logs
//! it leaves behind.
//!
//! A run is identified by its log directory and number (see
//! [`cloudless_core::LogPaths`]). [`train`] spawns the trainer, streams its
//! output into `<prefix>.log`, derives the tab-separated
//! `<prefix>.log.train` / `<prefix>.log.validate` series and copies the final
//! snapshot to the requested weight file. [`parse_logs`] reads those series
//! back for plotting or reporting.
//!
//! ```no_run
//! use cloudless_train::{parse_logs, train, TrainParams, TrainerEnv};
//!
//! # fn main() -> Result<(), cloudless_train::TrainError> {
//! let env = TrainerEnv::from_env()?;
//! let outcome = train(&env, &TrainParams::default())?;
//! let (training, validation) = parse_logs(&outcome.log_file)?;
//! println!("{} training / {} validation points", training.len(), validation.len());
//! # Ok(())
//! # }
//! ```

mod artifacts;
mod env;
mod error;
mod log_parser;
mod trainer;

pub use artifacts::{
    copy_trained_weights, finalize_parsed_logs, normalize_parsed_log, trained_weight_file,
    SolverHyperparameters,
};
pub use env::{TrainerEnv, CAFFE_HOME_VAR};
pub use error::TrainError;
pub use log_parser::{parse_logs, parse_run_logs, parse_series, LogSample, LogSeries};
pub use trainer::{
    generate_parsed_logs, run_command_logged, run_trainer, train, TrainOutcome, TrainParams,
};
