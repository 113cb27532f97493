use crate::{
    augment, crop_examples, load_annotations, shuffle_split, ClassBalancer, PrepareError,
    PreparationStatistics, Unbalanced,
};
use cloudless_core::{AnnotatedImage, LogPaths, TrainingExample};
use cloudless_records::{RecordWriter, RecordWriterParams, WriteSummary};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of a preparation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareParams {
    /// Annotation export, a JSON list of `{image_name, image_annotation}`.
    pub input_metadata: PathBuf,
    /// Directory the image names in the export are relative to.
    pub input_images: PathBuf,
    /// Where cropped examples go; wiped on every run.
    pub output_images: PathBuf,
    /// Parent of `train_leveldb` and `validation_leveldb`.
    pub output_records: PathBuf,
    pub records: RecordWriterParams,
    pub seed: u64,
    pub train_fraction: f64,
    pub do_augmentation: bool,
    /// Pack the record stores after preparing the images.
    pub write_records: bool,
    pub log_dir: PathBuf,
    pub log_num: u32,
}

impl Default for PrepareParams {
    fn default() -> Self {
        Self {
            input_metadata: PathBuf::from("data/planetlab/metadata/annotated.json"),
            input_images: PathBuf::from("data/planetlab/metadata"),
            output_images: PathBuf::from("data/planetlab/images/bounded"),
            output_records: PathBuf::from("data/leveldb"),
            records: RecordWriterParams::default(),
            seed: 0,
            train_fraction: 0.8,
            do_augmentation: false,
            write_records: true,
            log_dir: PathBuf::from("logs"),
            log_num: 1,
        }
    }
}

impl PrepareParams {
    pub fn log_paths(&self) -> LogPaths {
        LogPaths::new(&self.log_dir, self.log_num)
    }

    pub fn train_store(&self) -> PathBuf {
        self.output_records.join("train_leveldb")
    }

    pub fn validation_store(&self) -> PathBuf {
        self.output_records.join("validation_leveldb")
    }

    pub fn augmentation_dir(&self) -> PathBuf {
        self.output_images.join("augmentation")
    }

    pub fn validation_dir(&self) -> PathBuf {
        self.output_images.join("validation")
    }
}

/// Result of [`Preparer::prepare`].
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedDataset {
    pub train: Vec<TrainingExample>,
    pub validation: Vec<TrainingExample>,
    pub statistics: PreparationStatistics,
    /// Packing summaries, when records were written.
    pub train_records: Option<WriteSummary>,
    pub validation_records: Option<WriteSummary>,
}

/// Crops, splits, augments and packs annotated images.
pub struct Preparer {
    params: PrepareParams,
    balancer: Box<dyn ClassBalancer>,
}

impl Preparer {
    pub fn new(params: PrepareParams) -> Self {
        Self {
            params,
            balancer: Box::new(Unbalanced),
        }
    }

    pub fn with_balancer(mut self, balancer: impl ClassBalancer + 'static) -> Self {
        self.balancer = Box::new(balancer);
        self
    }

    pub fn params(&self) -> &PrepareParams {
        &self.params
    }

    /// Load the annotation export named in the params and prepare it.
    pub fn run(&self) -> Result<PreparedDataset, PrepareError> {
        let annotated = load_annotations(&self.params.input_metadata, &self.params.input_images)?;
        self.prepare(&annotated)
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(images = annotated.len()))
    )]
    pub fn prepare(&self, annotated: &[AnnotatedImage]) -> Result<PreparedDataset, PrepareError> {
        let p = &self.params;
        // Validate up front so a bad fraction does not wipe any outputs.
        if !(p.train_fraction > 0.0 && p.train_fraction <= 1.0) {
            return Err(PrepareError::InvalidFraction(p.train_fraction));
        }
        let writer = if p.write_records {
            Some(RecordWriter::new(p.records)?)
        } else {
            None
        };

        info!(
            "cropping {} annotated images into {}",
            annotated.len(),
            p.output_images.display()
        );
        let cropped = crop_examples(annotated, &p.output_images)?;

        let split = shuffle_split(&cropped.examples, p.seed, p.train_fraction)?;
        info!(
            "split {} examples into {} training and {} validation",
            cropped.examples.len(),
            split.train.len(),
            split.validation.len()
        );

        let train = if p.do_augmentation {
            augment(&split.train, p.augmentation_dir())?
        } else {
            info!("not doing data augmentation");
            split.train
        };
        let train = self.balancer.balance(train);

        let statistics = PreparationStatistics::new(
            cropped.raw_input_images,
            cropped.examples.len(),
            &train,
            split.validation.len(),
            p.do_augmentation,
            self.balancer.is_active(),
        );
        let report = p.log_paths().preparation_statistics();
        info!("saving preparation statistics to {}", report.display());
        statistics.write_report(&report)?;

        let (train_records, validation_records) = match writer {
            Some(writer) => (
                Some(writer.write_examples(p.train_store(), &train)?),
                Some(writer.write_examples(p.validation_store(), &split.validation)?),
            ),
            None => (None, None),
        };

        copy_validation_images(&split.validation, &p.validation_dir())?;

        Ok(PreparedDataset {
            train,
            validation: split.validation,
            statistics,
            train_records,
            validation_records,
        })
    }
}

/// Copy validation files into `dir`, wiped first, keeping their names.
pub fn copy_validation_images(
    validation: &[TrainingExample],
    dir: &Path,
) -> Result<(), PrepareError> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    info!("copying {} validation images to {}", validation.len(), dir.display());
    for example in validation {
        if let Some(name) = example.path.file_name() {
            fs::copy(&example.path, dir.join(name))?;
        }
    }
    Ok(())
}
