use std::path::PathBuf;

/// Errors produced while packing or reading record stores.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Decode(#[from] prost::DecodeError),

    #[error("record store {path}: {message}")]
    Store { path: PathBuf, message: String },

    #[error("record store {0} does not exist")]
    MissingStore(PathBuf),

    #[error("got {paths} image paths but {targets} targets")]
    LengthMismatch { paths: usize, targets: usize },

    #[error("record index {0} does not fit in an 8-digit key")]
    KeyOverflow(usize),

    #[error("commit_every must be > 0")]
    InvalidBatchSize,

    #[error("invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("datum holds {got} bytes, expected {expected} for {channels}x{height}x{width}")]
    DatumShape {
        channels: i32,
        height: i32,
        width: i32,
        expected: usize,
        got: usize,
    },
}
