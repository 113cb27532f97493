//! Raster access: size queries and window extraction.

use crate::RasterError;
use image::{DynamicImage, ImageFormat};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Reads raster sizes and cuts square windows out of rasters.
pub trait RasterBackend {
    /// `(width, height)` in pixels.
    fn dimensions(&self, raster: &Path) -> Result<(u32, u32), RasterError>;

    /// Write the `size × size` window at `(x, y)` of `raster` to `dest` as TIFF.
    fn crop(&self, raster: &Path, x: u32, y: u32, size: u32, dest: &Path)
        -> Result<(), RasterError>;
}

impl<B: RasterBackend + ?Sized> RasterBackend for &B {
    fn dimensions(&self, raster: &Path) -> Result<(u32, u32), RasterError> {
        (**self).dimensions(raster)
    }

    fn crop(
        &self,
        raster: &Path,
        x: u32,
        y: u32,
        size: u32,
        dest: &Path,
    ) -> Result<(), RasterError> {
        (**self).crop(raster, x, y, size, dest)
    }
}

/// Which backend a config selects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// GDAL command line tools; handles any GeoTIFF GDAL can read.
    #[default]
    Gdal,
    /// In-process decoding with the `image` crate.
    Image,
}

impl BackendKind {
    pub fn backend(self) -> Box<dyn RasterBackend> {
        match self {
            BackendKind::Gdal => Box::new(GdalBackend),
            BackendKind::Image => Box::new(ImageBackend::default()),
        }
    }
}

/// `gdalinfo -json` for sizes, `gdal_translate -srcwin` for windows.
#[derive(Clone, Copy, Debug, Default)]
pub struct GdalBackend;

impl GdalBackend {
    fn run(program: &str, args: &[&str]) -> Result<Vec<u8>, RasterError> {
        debug!("running {program} {args:?}");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| RasterError::Command {
                program: program.to_string(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(RasterError::Command {
                program: program.to_string(),
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(output.stdout)
    }
}

/// Pixel size from `gdalinfo -json` output (`"size": [width, height]`).
pub fn parse_gdalinfo_size(raster: &Path, info: &Value) -> Result<(u32, u32), RasterError> {
    let bad = |message: &str| RasterError::RasterInfo {
        path: raster.to_path_buf(),
        message: message.to_string(),
    };
    let size = info
        .get("size")
        .and_then(Value::as_array)
        .ok_or_else(|| bad("no `size` field"))?;
    let dim = |i: usize| {
        size.get(i)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| bad("`size` is not a pair of pixel counts"))
    };
    Ok((dim(0)?, dim(1)?))
}

impl RasterBackend for GdalBackend {
    fn dimensions(&self, raster: &Path) -> Result<(u32, u32), RasterError> {
        let path = raster.to_string_lossy();
        let stdout = Self::run("gdalinfo", &["-json", &path])?;
        let info: Value = serde_json::from_slice(&stdout)?;
        parse_gdalinfo_size(raster, &info)
    }

    fn crop(
        &self,
        raster: &Path,
        x: u32,
        y: u32,
        size: u32,
        dest: &Path,
    ) -> Result<(), RasterError> {
        let (x, y, size) = (x.to_string(), y.to_string(), size.to_string());
        let (src, dst) = (raster.to_string_lossy(), dest.to_string_lossy());
        Self::run(
            "gdal_translate",
            &["-q", "-of", "GTiff", "-srcwin", &x, &y, &size, &size, &src, &dst],
        )?;
        Ok(())
    }
}

/// Decodes the whole raster with the `image` crate.
///
/// The last decoded raster is kept, so cutting all tiles of one scene
/// decodes it once.
#[derive(Debug, Default)]
pub struct ImageBackend {
    decoded: RefCell<Option<(PathBuf, DynamicImage)>>,
}

impl ImageBackend {
    fn with_decoded<R>(
        &self,
        raster: &Path,
        f: impl FnOnce(&DynamicImage) -> R,
    ) -> Result<R, RasterError> {
        if let Some((path, img)) = &*self.decoded.borrow() {
            if path == raster {
                return Ok(f(img));
            }
        }
        // Drop the previous scene before decoding the next one.
        self.decoded.replace(None);
        debug!("decoding {}", raster.display());
        let img = image::ImageReader::open(raster)?
            .with_guessed_format()?
            .decode()?;
        let out = f(&img);
        self.decoded.replace(Some((raster.to_path_buf(), img)));
        Ok(out)
    }
}

impl RasterBackend for ImageBackend {
    fn dimensions(&self, raster: &Path) -> Result<(u32, u32), RasterError> {
        Ok(image::ImageReader::open(raster)?
            .with_guessed_format()?
            .into_dimensions()?)
    }

    fn crop(
        &self,
        raster: &Path,
        x: u32,
        y: u32,
        size: u32,
        dest: &Path,
    ) -> Result<(), RasterError> {
        self.with_decoded(raster, |img| {
            img.crop_imm(x, y, size, size)
                .save_with_format(dest, ImageFormat::Tiff)
        })??;
        Ok(())
    }
}
