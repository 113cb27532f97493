//! Turning annotated images into training examples on disk.

use crate::PrepareError;
use cloudless_core::{file_stem_and_ext, AnnotatedImage, Target, TrainingExample};
use image::DynamicImage;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Output of [`crop_examples`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CropOutput {
    pub examples: Vec<TrainingExample>,
    /// Annotated images read, including those that were skipped.
    pub raw_input_images: usize,
    /// Boxes skipped as invalid for their image.
    pub invalid_boxes: usize,
    /// Source images that could not be read.
    pub unreadable_images: usize,
}

/// Materialize one example per negative image and one per cloud box.
///
/// `output_dir` is wiped first. Negatives keep their file name; crops are
/// named `<stem>_cloud_NNN<ext>` numbered from 001 over the successful crops
/// of that image. Alpha channels are dropped in both cases.
pub fn crop_examples(
    annotated: &[AnnotatedImage],
    output_dir: impl AsRef<Path>,
) -> Result<CropOutput, PrepareError> {
    let output_dir = output_dir.as_ref();
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    let mut out = CropOutput {
        raw_input_images: annotated.len(),
        ..CropOutput::default()
    };

    for entry in annotated {
        let img = match image::open(&entry.image_path) {
            Ok(img) => img,
            Err(err) => {
                warn!("unable to read {}: {err}", entry.image_path.display());
                out.unreadable_images += 1;
                continue;
            }
        };

        if entry.boxes.is_empty() {
            let dest = output_dir.join(&entry.image_name);
            match save_rgb(&img, &dest) {
                Ok(()) => {
                    debug!("processed clear image {}", dest.display());
                    out.examples.push(TrainingExample::new(dest, Target::Clear));
                }
                Err(err) => warn!("unable to write {}: {err}", dest.display()),
            }
            continue;
        }

        let (stem, ext) = file_stem_and_ext(Path::new(&entry.image_name));
        let mut cloud_num = 1;
        for bbox in &entry.boxes {
            if !bbox.fits_within(img.width(), img.height()) {
                warn!(
                    "invalid crop {bbox} for {} ({}x{})",
                    entry.image_name,
                    img.width(),
                    img.height()
                );
                out.invalid_boxes += 1;
                continue;
            }
            let dest = output_dir.join(format!("{stem}_cloud_{cloud_num:03}{ext}"));
            // fits_within guarantees non-negative coordinates within u32 range.
            let crop = img.crop_imm(
                bbox.x as u32,
                bbox.y as u32,
                bbox.width as u32,
                bbox.height as u32,
            );
            match save_rgb(&crop, &dest) {
                Ok(()) => {
                    debug!("processed cloud crop {}", dest.display());
                    out.examples.push(TrainingExample::new(dest, Target::Cloud));
                    cloud_num += 1;
                }
                Err(err) => {
                    warn!("unable to write {}: {err}", dest.display());
                    out.invalid_boxes += 1;
                }
            }
        }
    }

    info!(
        "{} examples from {} annotated images ({} invalid boxes, {} unreadable images)",
        out.examples.len(),
        out.raw_input_images,
        out.invalid_boxes,
        out.unreadable_images
    );
    Ok(out)
}

fn save_rgb(img: &DynamicImage, dest: &Path) -> Result<(), image::ImageError> {
    img.to_rgb8().save(dest)
}
