use cloudless_records::RecordError;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Records(#[from] RecordError),

    #[error("threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("cannot start model {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model process closed its output")]
    ModelExited,

    #[error("model answered {0:?}, expected a probability in [0, 1]")]
    InvalidProbability(String),
}
