//! Band/contrast transform for multi-band analytic scenes.

use crate::AcquireError;
use log::debug;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Command;

/// Runs an external program to completion.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<(), AcquireError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[OsString]) -> Result<(), AcquireError> {
        (**self).run(program, args)
    }
}

/// Runs programs found on `PATH`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<(), AcquireError> {
        debug!("running {program} {args:?}");
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| AcquireError::Command {
                program: program.to_string(),
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(AcquireError::Command {
                program: program.to_string(),
                message: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}

fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    items.into_iter().map(|s| s.as_ref().to_os_string()).collect()
}

/// Turn an analytic scene at `src` into a viewable RGB raster at `dest`.
///
/// Three steps chained through a scratch directory that is removed on every
/// exit path: keep bands 3, 2, 1 as RGB, warp to Web Mercator, then apply a
/// sigmoidal contrast stretch.
pub fn band_transform(
    runner: &dyn CommandRunner,
    src: &Path,
    dest: &Path,
) -> Result<(), AcquireError> {
    let scratch = tempfile::Builder::new().prefix("cloudless-bands").tempdir()?;
    let bands = scratch.path().join("bands.tif");
    let warped = scratch.path().join("warped.tif");

    runner.run(
        "gdal_translate",
        &args([
            OsStr::new("-b"),
            OsStr::new("3"),
            OsStr::new("-b"),
            OsStr::new("2"),
            OsStr::new("-b"),
            OsStr::new("1"),
            src.as_os_str(),
            bands.as_os_str(),
        ]),
    )?;
    runner.run(
        "gdalwarp",
        &args([
            OsStr::new("-t_srs"),
            OsStr::new("EPSG:3857"),
            bands.as_os_str(),
            warped.as_os_str(),
        ]),
    )?;
    runner.run(
        "convert",
        &args([
            warped.as_os_str(),
            OsStr::new("-sigmoidal-contrast"),
            OsStr::new("15x50%"),
            dest.as_os_str(),
        ]),
    )?;
    Ok(())
}
