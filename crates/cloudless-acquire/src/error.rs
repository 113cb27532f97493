use std::path::PathBuf;

/// Errors produced while searching for and downloading scenes.
#[derive(thiserror::Error, Debug)]
pub enum AcquireError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid search location: {0}")]
    InvalidLocation(String),

    #[error("PLANET_KEY environment variable not set")]
    MissingApiKey,

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("malformed provider response: {0}")]
    MalformedPage(String),

    #[error("cannot derive a file name from url {0}")]
    MalformedUrl(String),

    #[error("`{program}` failed: {message}")]
    Command { program: String, message: String },

    #[error("downloaded scene {path} is not a readable raster: {message}")]
    InvalidScene { path: PathBuf, message: String },

    #[error("giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: Box<AcquireError>,
    },
}
