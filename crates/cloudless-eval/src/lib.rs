//! Validation of a trained cloud classifier.
//!
//! Every record of the validation store is decoded back to an RGB image and
//! scored by a [`CloudModel`]; a probability at or above the threshold counts
//! as a cloud prediction. The outcomes are tallied in a [`ConfusionMatrix`]
//! from which accuracy, precision, recall and F1 follow.
//!
//! The network itself lives outside this crate. [`CommandModel`] talks to a
//! predictor process over stdin/stdout, one image path per line in and one
//! probability per line out.
//!
//! ```no_run
//! use cloudless_eval::{run_evaluation, CommandModel, EvalParams};
//!
//! # fn main() -> Result<(), cloudless_eval::EvalError> {
//! let model = CommandModel::spawn("./predict", ["--weights", "logs/latest.caffemodel"])?;
//! let report = run_evaluation(&EvalParams::default(), model)?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

mod confusion;
mod error;
mod evaluate;
mod model;

pub use confusion::{ConfusionMatrix, EvaluationReport, Metrics};
pub use error::EvalError;
pub use evaluate::{evaluate, evaluate_store, run_evaluation, EvalParams};
pub use model::{parse_probability, CloudModel, CommandModel};
