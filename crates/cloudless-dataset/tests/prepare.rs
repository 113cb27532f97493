use cloudless_core::{AnnotatedImage, BoundingBox, Target, TrainingExample};
use cloudless_dataset::{
    augment, crop_examples, PrepareError, PrepareParams, Preparer,
};
use cloudless_records::{RecordStore, RecordWriterParams};
use image::{ColorType, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

fn write_rgba(path: &Path, w: u32, h: u32) {
    RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8 * 5, y as u8 * 5, 90, 200]))
        .save(path)
        .expect("save fixture");
}

fn annotated(dir: &Path, name: &str, boxes: Vec<BoundingBox>) -> AnnotatedImage {
    AnnotatedImage {
        image_name: name.to_string(),
        image_path: dir.join(name),
        boxes,
    }
}

fn names(examples: &[TrainingExample]) -> Vec<String> {
    examples
        .iter()
        .map(|e| e.path.file_name().expect("name").to_string_lossy().into_owned())
        .collect()
}

#[test]
fn clear_images_become_one_rgb_negative() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).expect("mkdir");
    write_rgba(&input.join("clear.png"), 12, 9);

    let out = dir.path().join("bounded");
    let cropped =
        crop_examples(&[annotated(&input, "clear.png", vec![])], &out).expect("crop");
    assert_eq!(cropped.examples, vec![TrainingExample::new(out.join("clear.png"), Target::Clear)]);

    let img = image::open(out.join("clear.png")).expect("open");
    assert_eq!(img.color(), ColorType::Rgb8);
    assert_eq!((img.width(), img.height()), (12, 9));
}

#[test]
fn every_valid_box_becomes_a_numbered_positive() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).expect("mkdir");
    write_rgba(&input.join("cloudy.png"), 40, 30);

    let boxes = vec![
        BoundingBox::new(0, 0, 10, 10),
        // Runs off the right edge.
        BoundingBox::new(35, 25, 10, 10),
        BoundingBox::new(5, 5, 8, 6),
        // Degenerate.
        BoundingBox::new(1, 1, 0, 4),
    ];
    let out = dir.path().join("bounded");
    let cropped = crop_examples(&[annotated(&input, "cloudy.png", boxes)], &out).expect("crop");

    assert_eq!(names(&cropped.examples), ["cloudy_cloud_001.png", "cloudy_cloud_002.png"]);
    assert!(cropped.examples.iter().all(|e| e.target == Target::Cloud));
    assert_eq!(cropped.invalid_boxes, 2);

    let second = image::open(out.join("cloudy_cloud_002.png")).expect("open");
    assert_eq!((second.width(), second.height()), (8, 6));
    assert_eq!(second.color(), ColorType::Rgb8);
    assert_eq!(second.to_rgb8().get_pixel(0, 0).0, [25, 25, 90]);
}

#[test]
fn boxes_with_overflowing_edges_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).expect("mkdir");
    write_rgba(&input.join("huge.png"), 20, 20);

    let boxes = vec![
        "9223372036854775807,0,10,10".parse().expect("parse"),
        BoundingBox::new(0, 1, 5, i64::MAX),
        BoundingBox::new(2, 2, 4, 4),
    ];
    let out = dir.path().join("bounded");
    let cropped = crop_examples(&[annotated(&input, "huge.png", boxes)], &out).expect("crop");

    assert_eq!(names(&cropped.examples), ["huge_cloud_001.png"]);
    assert_eq!(cropped.invalid_boxes, 2);
}

#[test]
fn unreadable_images_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).expect("mkdir");
    write_rgba(&input.join("ok.png"), 4, 4);

    let out = dir.path().join("bounded");
    let cropped = crop_examples(
        &[
            annotated(&input, "missing.png", vec![BoundingBox::new(0, 0, 1, 1)]),
            annotated(&input, "ok.png", vec![]),
        ],
        &out,
    )
    .expect("crop");
    assert_eq!(cropped.raw_input_images, 2);
    assert_eq!(cropped.unreadable_images, 1);
    assert_eq!(names(&cropped.examples), ["ok.png"]);
}

#[test]
fn augmentation_quadruples_the_training_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut train = Vec::new();
    for i in 0..3 {
        let path = dir.path().join(format!("t{i}.png"));
        write_rgba(&path, 6, 4);
        train.push(TrainingExample::new(path, Target::Cloud));
    }
    let broken = dir.path().join("broken.png");
    std::fs::write(&broken, b"nope").expect("write");
    train.push(TrainingExample::new(broken, Target::Clear));

    let aug_dir = dir.path().join("augmentation");
    let out = augment(&train, &aug_dir).expect("augment");
    // The unreadable example is dropped, the other three grow fourfold.
    assert_eq!(out.len(), 12);
    assert_eq!(out[0], train[0]);
    assert_eq!(
        out[1..4].iter().map(|e| e.path.clone()).collect::<Vec<PathBuf>>(),
        vec![
            aug_dir.join("t0_augment_1.png"),
            aug_dir.join("t0_augment_2.png"),
            aug_dir.join("t0_augment_3.png"),
        ]
    );
    assert!(out.iter().all(|e| e.target == Target::Cloud));

    let quarter = image::open(aug_dir.join("t0_augment_1.png")).expect("open");
    assert_eq!((quarter.width(), quarter.height()), (4, 6));
}

fn fixture(dir: &Path) -> PrepareParams {
    let input = dir.join("metadata");
    std::fs::create_dir_all(&input).expect("mkdir");
    let mut entries = Vec::new();
    for i in 0..10 {
        let name = format!("clear_{i}.png");
        write_rgba(&input.join(&name), 16, 16);
        entries.push(serde_json::json!({"image_name": name, "image_annotation": []}));
    }
    for i in 0..2 {
        let name = format!("cloudy_{i}.png");
        write_rgba(&input.join(&name), 16, 16);
        entries.push(serde_json::json!({
            "image_name": name,
            "image_annotation": ["0,0,8,8", "4,4,10,10"]
        }));
    }
    let metadata = input.join("annotated.json");
    std::fs::write(&metadata, serde_json::to_string(&entries).expect("json")).expect("write");

    PrepareParams {
        input_metadata: metadata,
        input_images: input,
        output_images: dir.join("bounded"),
        output_records: dir.join("leveldb"),
        records: RecordWriterParams {
            width: 8,
            height: 8,
            commit_every: 5,
        },
        log_dir: dir.join("logs"),
        log_num: 3,
        ..PrepareParams::default()
    }
}

#[test]
fn prepare_packs_both_stores_and_reports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let params = PrepareParams {
        do_augmentation: true,
        ..fixture(dir.path())
    };
    let prepared = Preparer::new(params.clone()).run().expect("prepare");

    // 10 clear + 2 * 2 boxes = 14 examples; ceil(14 * 0.2) = 3 validate.
    assert_eq!(prepared.validation.len(), 3);
    assert_eq!(prepared.train.len(), 11 * 4);
    let stats = &prepared.statistics;
    assert_eq!(stats.raw_input_images, 12);
    assert_eq!(stats.generated_examples, 14);
    assert_eq!(stats.total_training, 44);
    assert_eq!(stats.positive + stats.negative, 44);
    assert!(stats.augmented);
    assert!(!stats.balanced);

    let report = dir.path().join("logs/output0003.preparation_statistics.txt");
    let text = std::fs::read_to_string(report).expect("report");
    assert!(text.contains("Data augmentation: yes"));

    let mut train = RecordStore::open(params.train_store()).expect("train store");
    let records = train.records().expect("records");
    assert_eq!(records.len(), 44);
    assert_eq!(records[0].key, "00000000");
    assert_eq!(records[43].key, "00000043");
    for (record, example) in records.iter().zip(&prepared.train) {
        assert_eq!(record.datum.target(), example.target);
        assert_eq!((record.datum.width(), record.datum.height()), (8, 8));
    }
    let mut validation = RecordStore::open(params.validation_store()).expect("validation store");
    assert_eq!(validation.records().expect("records").len(), 3);

    let copied = std::fs::read_dir(params.validation_dir()).expect("validation dir").count();
    assert_eq!(copied, 3);
}

#[test]
fn prepare_is_reproducible() {
    let dir = tempfile::tempdir().expect("tempdir");
    let params = PrepareParams {
        write_records: false,
        ..fixture(dir.path())
    };
    let first = Preparer::new(params.clone()).run().expect("first run");
    let second = Preparer::new(params).run().expect("second run");
    assert_eq!(first.validation, second.validation);
    assert_eq!(first.train, second.train);
    assert!(first.train_records.is_none());
}

#[test]
fn bad_fraction_leaves_outputs_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let params = PrepareParams {
        train_fraction: 0.0,
        ..fixture(dir.path())
    };
    let err = Preparer::new(params.clone()).run().expect_err("bad fraction");
    assert!(matches!(err, PrepareError::InvalidFraction(_)));
    assert!(!params.output_images.exists());
}
