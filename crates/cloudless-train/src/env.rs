use crate::TrainError;
use std::path::{Path, PathBuf};

/// Environment variable naming the Caffe installation.
pub const CAFFE_HOME_VAR: &str = "CAFFE_HOME";

/// Location of the external trainer installation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainerEnv {
    caffe_home: PathBuf,
}

impl TrainerEnv {
    pub fn new(caffe_home: impl Into<PathBuf>) -> Self {
        Self {
            caffe_home: caffe_home.into(),
        }
    }

    /// Read `CAFFE_HOME`. An unset or empty variable is fatal.
    pub fn from_env() -> Result<Self, TrainError> {
        match std::env::var_os(CAFFE_HOME_VAR) {
            Some(home) if !home.is_empty() => Ok(Self::new(home)),
            _ => Err(TrainError::MissingCaffeHome),
        }
    }

    pub fn caffe_home(&self) -> &Path {
        &self.caffe_home
    }

    /// `$CAFFE_HOME/build/tools/caffe`
    pub fn caffe_binary(&self) -> PathBuf {
        self.caffe_home.join("build").join("tools").join("caffe")
    }

    /// `$CAFFE_HOME/tools/extra/parse_log.py`
    pub fn parse_log_script(&self) -> PathBuf {
        self.caffe_home.join("tools").join("extra").join("parse_log.py")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_locations_hang_off_the_install() {
        let env = TrainerEnv::new("/usr/local/caffe");
        assert_eq!(
            env.caffe_binary(),
            PathBuf::from("/usr/local/caffe/build/tools/caffe")
        );
        assert_eq!(
            env.parse_log_script(),
            PathBuf::from("/usr/local/caffe/tools/extra/parse_log.py")
        );
    }

    #[test]
    fn missing_home_message_explains_the_fix() {
        let msg = TrainError::MissingCaffeHome.to_string();
        assert!(msg.contains("export CAFFE_HOME=/usr/local/caffe"));
    }
}
