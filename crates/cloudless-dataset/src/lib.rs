//! Dataset preparation for the cloud classifier.
//!
//! Starting from the annotation export, every clear image becomes one
//! negative example and every cloud box one cropped positive example. The
//! examples are shuffled and split deterministically, the training part is
//! optionally augmented with rotations, statistics are reported, and both
//! parts are packed into record stores for the trainer.
//!
//! ```no_run
//! use cloudless_dataset::{PrepareParams, Preparer};
//!
//! # fn main() -> Result<(), cloudless_dataset::PrepareError> {
//! let params = PrepareParams {
//!     do_augmentation: true,
//!     ..PrepareParams::default()
//! };
//! let prepared = Preparer::new(params).run()?;
//! println!("{}", prepared.statistics);
//! # Ok(())
//! # }
//! ```

mod augment;
mod balance;
mod crop;
mod error;
mod metadata;
mod prepare;
mod split;
mod stats;

pub use augment::{augment, rotations, ROTATIONS};
pub use balance::{ClassBalancer, Unbalanced};
pub use crop::{crop_examples, CropOutput};
pub use error::{MetadataError, PrepareError};
pub use metadata::{load_annotations, parse_annotations};
pub use prepare::{copy_validation_images, PrepareParams, PreparedDataset, Preparer};
pub use split::{shuffle_split, validation_len, DatasetSplit};
pub use stats::{imbalance_ratio, PreparationStatistics};
