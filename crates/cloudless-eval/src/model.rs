//! The boundary to the trained network.

use crate::EvalError;
use image::RgbImage;
use log::debug;
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tempfile::TempDir;

/// Anything that scores an image with the probability that it shows cloud.
pub trait CloudModel {
    /// Probability in `[0, 1]`.
    fn cloud_probability(&mut self, image: &RgbImage) -> Result<f64, EvalError>;
}

impl<M: CloudModel + ?Sized> CloudModel for &mut M {
    fn cloud_probability(&mut self, image: &RgbImage) -> Result<f64, EvalError> {
        (**self).cloud_probability(image)
    }
}

impl<M: CloudModel + ?Sized> CloudModel for Box<M> {
    fn cloud_probability(&mut self, image: &RgbImage) -> Result<f64, EvalError> {
        (**self).cloud_probability(image)
    }
}

/// Parse one line of predictor output.
pub fn parse_probability(line: &str) -> Result<f64, EvalError> {
    let trimmed = line.trim();
    match trimmed.parse::<f64>() {
        Ok(p) if (0.0..=1.0).contains(&p) => Ok(p),
        _ => Err(EvalError::InvalidProbability(trimmed.to_string())),
    }
}

/// A long-running predictor process.
///
/// For every image the model writes a PNG into a private scratch directory,
/// sends its path as one line on the child's stdin and reads one probability
/// per line back from its stdout. The child is killed when the model is
/// dropped.
pub struct CommandModel {
    program: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    scratch: TempDir,
}

impl CommandModel {
    pub fn spawn<I, S>(program: impl AsRef<Path>, args: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref().to_path_buf();
        let scratch = tempfile::Builder::new().prefix("cloudless-eval").tempdir()?;
        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| EvalError::Spawn {
                program: program.clone(),
                source,
            })?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(EvalError::ModelExited);
        };
        debug!("started model {}", program.display());
        Ok(Self {
            program,
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            scratch,
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl CloudModel for CommandModel {
    fn cloud_probability(&mut self, image: &RgbImage) -> Result<f64, EvalError> {
        let path = self.scratch.path().join("input.png");
        image.save_with_format(&path, image::ImageFormat::Png)?;

        let stdin = self.stdin.as_mut().ok_or(EvalError::ModelExited)?;
        writeln!(stdin, "{}", path.display())?;
        stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(EvalError::ModelExited);
        }
        parse_probability(&line)
    }
}

impl Drop for CommandModel {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
