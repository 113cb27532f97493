//! LevelDB packing of labelled images for the external trainer.
//!
//! Each training example becomes one record: a fixed-width, zero-padded
//! decimal key (so lexicographic order equals insertion order) mapped to a
//! protobuf-encoded Caffe `Datum` holding the resized RGB pixels in
//! channel-major order plus the integer label.
//!
//! ```no_run
//! use cloudless_core::Target;
//! use cloudless_records::{RecordStore, RecordWriter, RecordWriterParams};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), cloudless_records::RecordError> {
//! let paths = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
//! let targets = vec![Target::Cloud, Target::Clear];
//! let writer = RecordWriter::new(RecordWriterParams::default())?;
//! let summary = writer.write("data/leveldb/train_leveldb", &paths, &targets)?;
//! println!("wrote {} records", summary.written);
//!
//! let mut store = RecordStore::open("data/leveldb/train_leveldb")?;
//! for record in store.records()? {
//!     println!("{} -> label {}", record.key, record.datum.label());
//! }
//! # Ok(())
//! # }
//! ```

mod datum;
mod error;
mod key;
mod store;
mod writer;

pub use datum::{Datum, RGB_CHANNELS};
pub use error::RecordError;
pub use key::{record_key, KEY_WIDTH, MAX_RECORDS};
pub use store::{Record, RecordBatch, RecordStore};
pub use writer::{RecordWriter, RecordWriterParams, WriteSummary};
