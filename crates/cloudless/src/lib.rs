//! Facade crate for the `cloudless-*` workspace.
//!
//! Cloudless finds clouds in satellite imagery. The pipeline runs in stages,
//! each in its own crate and each driven by a serde-configurable params
//! struct:
//!
//! - `cloudless::acquire`: search a provider around a point and download scenes.
//! - `cloudless::raster`: cut scenes into fixed-size PNG tiles, dropping incomplete ones.
//! - `cloudless::dataset`: crop annotated boxes into examples, split, augment, report.
//! - `cloudless::records`: pack examples into LevelDB stores of Caffe `Datum` records.
//! - `cloudless::train`: fine-tune through the external trainer and parse its logs.
//! - `cloudless::eval`: score the validation store and compute confusion statistics.
//!
//! [`PipelineConfig`] bundles every stage's params into one JSON document.
//!
//! ## Quickstart
//!
//! ```no_run
//! use cloudless::dataset::Preparer;
//! use cloudless::PipelineConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load_json("cloudless.json")?;
//! let prepared = Preparer::new(config.prepare).run()?;
//! println!("{}", prepared.statistics);
//! # Ok(())
//! # }
//! ```
//!
//! The `cloudless` binary (feature `cli`) exposes the same stages as
//! subcommands.

mod config;

pub use cloudless_acquire as acquire;
pub use cloudless_core as core;
pub use cloudless_dataset as dataset;
pub use cloudless_eval as eval;
pub use cloudless_raster as raster;
pub use cloudless_records as records;
pub use cloudless_train as train;

pub use cloudless_core::{AnnotatedImage, BoundingBox, Chunk, ProviderKind, Scene, Target, TrainingExample};

pub use config::{ChunkStage, ConfigError, PipelineConfig};
