//! Raster chunking: cut large scenes into fixed-size PNG tiles.
//!
//! A raster of `W × H` pixels yields tiles at offsets `k · S` along each
//! axis, `k < (D − S − 1) / S`, so undersized edge tiles never appear. Tiles
//! touching a fully transparent pixel (scene borders, blackfill) are
//! dropped. Raster access goes through [`RasterBackend`]: the GDAL command
//! line tools by default, or the `image` crate in-process.

mod backend;
mod chunker;
mod error;

pub use backend::{parse_gdalinfo_size, BackendKind, GdalBackend, ImageBackend, RasterBackend};
pub use chunker::{
    chunk, convert_to_png, has_transparent_pixel, import_scenes, list_scenes, tiles_along,
    ChunkParams, Chunks, ImportSummary,
};
pub use error::RasterError;
