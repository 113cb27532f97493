//! File naming helpers shared by the pipeline stages.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Locations of the per-run log artifacts.
///
/// Runs are numbered so their outputs stack over time: run 1 writes
/// `logs/output0001.log`, `logs/output0001.log.train`, and so on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogPaths {
    dir: PathBuf,
    prefix: PathBuf,
}

impl LogPaths {
    pub fn new(dir: impl Into<PathBuf>, run: u32) -> Self {
        let dir = dir.into();
        let prefix = dir.join(format!("output{run:04}"));
        Self { dir, prefix }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Common prefix of every artifact, e.g. `logs/output0001`.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Raw trainer output.
    pub fn log_file(&self) -> PathBuf {
        self.with_suffix(".log")
    }

    /// Parsed training series derived from the raw log.
    pub fn train_log(&self) -> PathBuf {
        self.with_suffix(".log.train")
    }

    /// Parsed validation series derived from the raw log.
    pub fn validate_log(&self) -> PathBuf {
        self.with_suffix(".log.validate")
    }

    pub fn preparation_statistics(&self) -> PathBuf {
        self.with_suffix(".preparation_statistics.txt")
    }

    pub fn evaluation_statistics(&self) -> PathBuf {
        self.with_suffix(".statistics.txt")
    }

    /// `prefix` + `suffix`, without inserting a path separator.
    pub fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut raw = self.prefix.clone().into_os_string();
        raw.push(suffix);
        PathBuf::from(raw)
    }
}

/// Split a file name into its stem and its extension including the dot.
///
/// `"scene_12.png"` becomes `("scene_12", ".png")`; a name without an
/// extension yields an empty extension.
pub fn file_stem_and_ext(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(OsStr::to_string_lossy)
        .unwrap_or_default()
        .into_owned();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

/// Insert `tag` between the stem and the extension of `path`'s file name.
pub fn suffixed_file_name(path: &Path, tag: &str) -> String {
    let (stem, ext) = file_stem_and_ext(path);
    format!("{stem}{tag}{ext}")
}
