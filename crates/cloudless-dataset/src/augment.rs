use crate::PrepareError;
use cloudless_core::{file_stem_and_ext, TrainingExample};
use image::DynamicImage;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Rotated copies written per training example.
pub const ROTATIONS: usize = 3;

/// 90°, 180° and 270° counter-clockwise rotations of `img`.
pub fn rotations(img: &DynamicImage) -> [DynamicImage; ROTATIONS] {
    [img.rotate270(), img.rotate180(), img.rotate90()]
}

/// Expand the training set with rotated copies.
///
/// `augmentation_dir` is wiped first. Each example is kept and followed by
/// its rotations, saved as `<stem>_augment_<1|2|3><ext>`. An example that
/// cannot be read or written is dropped entirely, original included.
pub fn augment(
    train: &[TrainingExample],
    augmentation_dir: impl AsRef<Path>,
) -> Result<Vec<TrainingExample>, PrepareError> {
    let dir = augmentation_dir.as_ref();
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;

    let mut out = Vec::with_capacity(train.len() * (ROTATIONS + 1));
    let mut dropped = 0;
    for example in train {
        match augment_one(example, dir) {
            Ok(copies) => {
                debug!("augmented {}", example.path.display());
                out.push(example.clone());
                out.extend(
                    copies
                        .into_iter()
                        .map(|path| TrainingExample::new(path, example.target)),
                );
            }
            Err(err) => {
                warn!("unable to augment {}: {err}", example.path.display());
                dropped += 1;
            }
        }
    }

    info!(
        "augmentation grew {} training examples to {} ({dropped} dropped)",
        train.len(),
        out.len()
    );
    Ok(out)
}

fn augment_one(example: &TrainingExample, dir: &Path) -> Result<Vec<PathBuf>, image::ImageError> {
    let img = image::open(&example.path)?;
    let (stem, ext) = file_stem_and_ext(&example.path);
    let mut written = Vec::with_capacity(ROTATIONS);
    for (idx, rotated) in rotations(&img).iter().enumerate() {
        let dest = dir.join(format!("{stem}_augment_{}{ext}", idx + 1));
        if let Err(err) = rotated.save(&dest) {
            for path in &written {
                let _ = fs::remove_file(path);
            }
            return Err(err);
        }
        written.push(dest);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn rotations_are_counter_clockwise() {
        // 2x1 image: red on the left, blue on the right.
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        let [quarter, half, three_quarters] = rotations(&DynamicImage::ImageRgb8(img));

        // A quarter turn CCW puts the right edge on top.
        let q = quarter.to_rgb8();
        assert_eq!(q.dimensions(), (1, 2));
        assert_eq!(q.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(q.get_pixel(0, 1).0, [255, 0, 0]);

        let h = half.to_rgb8();
        assert_eq!(h.get_pixel(0, 0).0, [0, 0, 255]);

        let t = three_quarters.to_rgb8();
        assert_eq!(t.get_pixel(0, 0).0, [255, 0, 0]);
    }
}
