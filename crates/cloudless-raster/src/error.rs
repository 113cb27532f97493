use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid scene pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Glob(#[from] glob::GlobError),

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` failed: {message}")]
    Command { program: String, message: String },

    #[error("cannot read raster size of {path}: {message}")]
    RasterInfo { path: PathBuf, message: String },

    #[error("chunk size must be > 0")]
    InvalidChunkSize,
}
