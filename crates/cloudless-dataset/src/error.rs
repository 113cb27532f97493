use cloudless_core::BoundingBoxParseError;
use cloudless_records::RecordError;
use std::path::PathBuf;

/// Errors produced while reading the annotation metadata.
#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("cannot read metadata {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("bad bounding box {value:?} for image {image}: {source}")]
    BadBox {
        image: String,
        value: String,
        #[source]
        source: BoundingBoxParseError,
    },
}

/// Errors produced while preparing a dataset.
#[derive(thiserror::Error, Debug)]
pub enum PrepareError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Records(#[from] RecordError),

    #[error("train_fraction must be in (0, 1], got {0}")]
    InvalidFraction(f64),
}
