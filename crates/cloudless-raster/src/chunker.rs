use crate::{BackendKind, RasterBackend, RasterError};
use cloudless_core::{file_stem_and_ext, Chunk};
use image::{DynamicImage, ImageFormat};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters for chunking and scene import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkParams {
    /// Side of the square tiles, in pixels.
    pub chunk_size: u32,
    pub backend: BackendKind,
    /// Remove each source scene once it has been chunked.
    pub delete_source: bool,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            backend: BackendKind::default(),
            delete_source: false,
        }
    }
}

/// Number of whole tiles along an axis of `extent` pixels.
///
/// Tiles start at `k * size` and stay one pixel clear of the far edge, so
/// partial edge tiles are never produced.
pub fn tiles_along(extent: u32, size: u32) -> u32 {
    if size == 0 || extent <= size + 1 {
        return 0;
    }
    (extent - size - 1) / size
}

/// Lazy, single-pass sequence of the accepted tiles of one raster.
///
/// Each `next` crops one window, converts it to PNG and drops it again if
/// it contains a fully transparent pixel. Dropped windows are counted in
/// [`Chunks::rejected_count`].
pub struct Chunks<B> {
    backend: B,
    raster: PathBuf,
    work_dir: PathBuf,
    base: String,
    size: u32,
    tiles_x: u32,
    tiles_y: u32,
    next: usize,
    rejected: usize,
}

impl<B: RasterBackend> Chunks<B> {
    pub fn raster(&self) -> &Path {
        &self.raster
    }

    /// Number of grid positions, accepted or not.
    pub fn grid_len(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    /// Windows discarded so far for transparent pixels.
    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    fn process(&mut self, x: u32, y: u32) -> Result<Option<Chunk>, RasterError> {
        let tif = self.work_dir.join(format!("{}-{x}-{y}.tif", self.base));
        self.backend.crop(&self.raster, x, y, self.size, &tif)?;
        let converted = convert_to_png(&tif);
        fs::remove_file(&tif)?;
        let (png, img) = converted?;

        if has_transparent_pixel(&img) {
            debug!("{} has transparent pixels, discarding", png.display());
            fs::remove_file(&png)?;
            self.rejected += 1;
            return Ok(None);
        }
        Ok(Some(Chunk {
            scene: self.base.clone(),
            x,
            y,
            size: self.size,
            path: png,
        }))
    }
}

impl<B: RasterBackend> Iterator for Chunks<B> {
    type Item = Result<Chunk, RasterError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.grid_len() {
            let idx = self.next;
            self.next += 1;
            // Columns outer, rows inner. Both quotients stay below a u32 tile
            // count, and every tile origin lies inside the raster.
            let rows = self.tiles_y as usize;
            let x = (idx / rows) as u32 * self.size;
            let y = (idx % rows) as u32 * self.size;
            match self.process(x, y) {
                Ok(Some(chunk)) => return Some(Ok(chunk)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

/// Split `raster` into `chunk_size` tiles written as PNGs under `work_dir`.
///
/// Tiles are named `<base>-<x>-<y>.png` after the raster's file stem.
pub fn chunk<B: RasterBackend>(
    backend: B,
    raster: impl AsRef<Path>,
    chunk_size: u32,
    work_dir: impl AsRef<Path>,
) -> Result<Chunks<B>, RasterError> {
    if chunk_size == 0 {
        return Err(RasterError::InvalidChunkSize);
    }
    let raster = raster.as_ref().to_path_buf();
    let work_dir = work_dir.as_ref().to_path_buf();
    fs::create_dir_all(&work_dir)?;

    let (width, height) = backend.dimensions(&raster)?;
    let (base, _) = file_stem_and_ext(&raster);
    let tiles_x = tiles_along(width, chunk_size);
    let tiles_y = tiles_along(height, chunk_size);
    debug!(
        "{}: {width}x{height} px, {tiles_x}x{tiles_y} tiles of {chunk_size}",
        raster.display()
    );

    Ok(Chunks {
        backend,
        raster,
        work_dir,
        base,
        size: chunk_size,
        tiles_x,
        tiles_y,
        next: 0,
        rejected: 0,
    })
}

/// Re-encode `tif` as a PNG next to it.
///
/// The PNG is written to a temporary file in the same directory and only
/// renamed into place once complete.
pub fn convert_to_png(tif: &Path) -> Result<(PathBuf, DynamicImage), RasterError> {
    let img = image::ImageReader::open(tif)?
        .with_guessed_format()?
        .decode()?;
    let png = tif.with_extension("png");
    let dir = match png.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        img.write_to(&mut out, ImageFormat::Png)?;
        out.flush()?;
    }
    tmp.persist(&png).map_err(|e| RasterError::Persist {
        path: png.clone(),
        source: e.error,
    })?;
    Ok((png, img))
}

/// Any pixel with alpha 0. Images without alpha are always complete.
pub fn has_transparent_pixel(img: &DynamicImage) -> bool {
    if !img.color().has_alpha() {
        return false;
    }
    img.to_rgba8().pixels().any(|p| p[3] == 0)
}

/// Summary of [`import_scenes`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub scenes: usize,
    pub chunks: Vec<Chunk>,
    pub rejected: usize,
    /// Scenes that could not be chunked at all.
    pub failed: Vec<PathBuf>,
}

/// Chunk every `*.tif` in `scene_dir` and move the accepted tiles to `dest`.
///
/// Scenes are processed in file-name order. A scene that cannot be read is
/// logged and skipped; a tile that fails mid-scene aborts that scene only.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(scene_dir = %scene_dir.as_ref().display()))
)]
pub fn import_scenes(
    scene_dir: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    params: &ChunkParams,
) -> Result<ImportSummary, RasterError> {
    let scene_dir = scene_dir.as_ref();
    let dest = dest.as_ref();
    fs::create_dir_all(dest)?;

    let mut scenes = list_scenes(scene_dir)?;
    scenes.sort();

    let backend = params.backend.backend();
    let work = tempfile::Builder::new()
        .prefix(".chunks")
        .tempdir_in(dest)?;
    let mut summary = ImportSummary::default();

    for scene in scenes {
        info!("processing {}", scene.display());
        match import_one(backend.as_ref(), &scene, work.path(), dest, params.chunk_size) {
            Ok((chunks, rejected)) => {
                summary.scenes += 1;
                summary.rejected += rejected;
                summary.chunks.extend(chunks);
                if params.delete_source {
                    fs::remove_file(&scene)?;
                }
            }
            Err(err) => {
                warn!("unable to chunk {}: {err}", scene.display());
                summary.failed.push(scene);
            }
        }
    }

    info!(
        "{} chunks imported from {} scenes ({} discarded as incomplete)",
        summary.chunks.len(),
        summary.scenes,
        summary.rejected
    );
    Ok(summary)
}

/// Every `*.tif` file directly inside `dir`, in no particular order.
pub fn list_scenes(dir: &Path) -> Result<Vec<PathBuf>, RasterError> {
    let pattern = format!(
        "{}/*.tif",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..glob::MatchOptions::new()
    };
    let mut scenes = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        let path = entry?;
        if path.is_file() {
            scenes.push(path);
        }
    }
    Ok(scenes)
}

fn import_one(
    backend: &dyn RasterBackend,
    scene: &Path,
    work_dir: &Path,
    dest: &Path,
    chunk_size: u32,
) -> Result<(Vec<Chunk>, usize), RasterError> {
    let mut chunks = chunk(backend, scene, chunk_size, work_dir)?;
    let mut moved = Vec::new();
    for item in chunks.by_ref() {
        let mut chunk = item?;
        let file_name = chunk
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        let target = dest.join(file_name);
        fs::rename(&chunk.path, &target)?;
        chunk.path = target;
        moved.push(chunk);
    }
    Ok((moved, chunks.rejected_count()))
}
