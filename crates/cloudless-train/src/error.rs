use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum TrainError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(
        "You must set CAFFE_HOME to point to where Caffe is installed. Example:\n\
         export CAFFE_HOME=/usr/local/caffe"
    )]
    MissingCaffeHome,

    #[error("cannot start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: PathBuf, status: ExitStatus },

    #[error("cannot read log {path}: {source}")]
    ReadLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no snapshot line in {0}; did training finish?")]
    MissingWeights(PathBuf),

    #[error("solver {path} has no `{field}` entry")]
    MissingSolverField { path: PathBuf, field: &'static str },
}
