use cloudless_acquire::AcquireParams;
use cloudless_dataset::PrepareParams;
use cloudless_eval::EvalParams;
use cloudless_raster::ChunkParams;
use cloudless_train::TrainParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Where chunking reads scenes from and writes tiles to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkStage {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub params: ChunkParams,
}

impl Default for ChunkStage {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/planetlab/raw"),
            output_dir: PathBuf::from("data/planetlab/images"),
            params: ChunkParams::default(),
        }
    }
}

/// Settings of every pipeline stage. Missing fields take their defaults,
/// so a config file only needs to name what it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub acquire: AcquireParams,
    pub chunk: ChunkStage,
    pub prepare: PrepareParams,
    pub train: TrainParams,
    pub eval: EvalParams,
}

impl PipelineConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_other_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{"prepare": {"seed": 7, "records": {"width": 64}}, "eval": {"threshold": 0.7}}"#,
        )
        .expect("parse");
        assert_eq!(cfg.prepare.seed, 7);
        assert_eq!(cfg.prepare.records.width, 64);
        assert_eq!(cfg.prepare.records.height, 256);
        assert_eq!(cfg.prepare.train_fraction, 0.8);
        assert_eq!(cfg.eval.threshold, 0.7);
        assert_eq!(cfg.chunk, ChunkStage::default());
        assert_eq!(cfg.acquire.buffer_meters, 200.0);
    }

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("conf/pipeline.json");
        let mut cfg = PipelineConfig::default();
        cfg.train.note = Some("baseline".to_string());
        cfg.chunk.params.chunk_size = 128;
        cfg.write_json(&path).expect("write");
        assert_eq!(PipelineConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn unreadable_config_names_the_file() {
        let err = PipelineConfig::load_json("/nonexistent/cloudless.json").expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/cloudless.json"));
    }
}
