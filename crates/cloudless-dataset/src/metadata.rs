//! Reading the annotation store export.
//!
//! The export is a JSON list of
//! `{"image_name": "...", "image_annotation": ["x,y,w,h", ...]}` records;
//! `image_annotation` may be `null` or missing for images nobody boxed.

use crate::MetadataError;
use cloudless_core::{AnnotatedImage, BoundingBox};
use log::info;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawEntry {
    image_name: String,
    #[serde(default)]
    image_annotation: Option<Vec<String>>,
}

/// Load `metadata` and resolve every image name against `images_dir`.
pub fn load_annotations(
    metadata: impl AsRef<Path>,
    images_dir: impl AsRef<Path>,
) -> Result<Vec<AnnotatedImage>, MetadataError> {
    let metadata = metadata.as_ref();
    info!("using metadata file {}", metadata.display());
    let text = std::fs::read_to_string(metadata).map_err(|source| MetadataError::Read {
        path: metadata.to_path_buf(),
        source,
    })?;
    parse_annotations(&text, images_dir)
}

/// Parse an export already in memory.
pub fn parse_annotations(
    json: &str,
    images_dir: impl AsRef<Path>,
) -> Result<Vec<AnnotatedImage>, MetadataError> {
    let images_dir = images_dir.as_ref();
    let entries: Vec<RawEntry> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .map(|entry| {
            let boxes = entry
                .image_annotation
                .unwrap_or_default()
                .iter()
                .map(|raw| {
                    raw.parse::<BoundingBox>()
                        .map_err(|source| MetadataError::BadBox {
                            image: entry.image_name.clone(),
                            value: raw.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AnnotatedImage {
                image_path: images_dir.join(&entry.image_name),
                image_name: entry.image_name,
                boxes,
            })
        })
        .collect()
}
