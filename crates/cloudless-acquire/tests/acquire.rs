use cloudless_acquire::{
    AcquireError, AcquireParams, Acquirer, CommandRunner, HttpTransport, RetryPolicy,
};
use cloudless_core::ProviderKind;
use image::{ImageFormat, RgbImage};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Cursor;
use std::path::Path;

fn png_bytes() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::new(4, 4)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

/// Serves canned pages and files; a URL may fail a number of times first.
#[derive(Default)]
struct FakeTransport {
    pages: HashMap<String, Value>,
    files: HashMap<String, Vec<u8>>,
    corrupt_first: RefCell<HashMap<String, usize>>,
    json_requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
    downloads: RefCell<Vec<String>>,
}

impl HttpTransport for FakeTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, AcquireError> {
        self.json_requests.borrow_mut().push((
            url.to_string(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self.pages.get(url).cloned().ok_or_else(|| AcquireError::Http {
            url: url.to_string(),
            message: "404".into(),
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, AcquireError> {
        self.downloads.borrow_mut().push(url.to_string());
        let body = self.files.get(url).ok_or_else(|| AcquireError::Http {
            url: url.to_string(),
            message: "404".into(),
        })?;
        let mut corrupt = self.corrupt_first.borrow_mut();
        let bytes: &[u8] = match corrupt.get_mut(url) {
            Some(left) if *left > 0 => {
                *left -= 1;
                &body[..10]
            }
            _ => body,
        };
        std::fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// Writes the last argument as the "output" of every command.
#[derive(Default)]
struct FakeRunner {
    programs: RefCell<Vec<String>>,
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<(), AcquireError> {
        self.programs.borrow_mut().push(program.to_string());
        let out = args.last().expect("output path");
        std::fs::write(out, program.as_bytes())?;
        Ok(())
    }
}

fn params(dir: &Path, provider: ProviderKind, max_attempts: u32) -> AcquireParams {
    AcquireParams {
        download_dir: dir.to_path_buf(),
        buffer_meters: 200.0,
        provider,
        retry: RetryPolicy {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        },
    }
}

const SEARCH: &str = "https://api.planet.com/v0/scenes/ortho/";

fn two_page_transport() -> FakeTransport {
    let mut t = FakeTransport::default();
    t.pages.insert(
        SEARCH.into(),
        json!({
            "features": [
                {"properties": {"links": {"full": "https://dl/scenes/s1/full"}}},
                {"properties": {"links": {"full": "https://dl/scenes/s2/full"}}}
            ],
            "links": {"next": "https://api.planet.com/v0/scenes/ortho/?page=2"}
        }),
    );
    t.pages.insert(
        "https://api.planet.com/v0/scenes/ortho/?page=2".into(),
        json!({
            "features": [
                {"properties": {"links": {"full": "https://dl/scenes/s3/full"}}}
            ],
            "links": {"next": null}
        }),
    );
    for s in ["s1", "s2", "s3"] {
        t.files
            .insert(format!("https://dl/scenes/{s}/full"), png_bytes());
    }
    t
}

#[test]
fn follows_pagination_and_downloads_every_scene() {
    let dir = tempfile::tempdir().expect("tempdir");
    let transport = two_page_transport();
    let acquirer = Acquirer::new(params(dir.path(), ProviderKind::PlanetScenes, 1), transport);

    let scenes = acquirer.acquire(37.7749, -122.4194).expect("acquire");
    let names: Vec<String> = scenes
        .iter()
        .map(|s| s.path.file_name().expect("name").to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["s1.full.tif", "s2.full.tif", "s3.full.tif"]);
    assert!(scenes.iter().all(|s| s.path.is_file()));
    assert!(scenes.iter().all(|s| s.provider == ProviderKind::PlanetScenes));
}

#[test]
fn first_request_carries_the_search_polygon() {
    let dir = tempfile::tempdir().expect("tempdir");
    let transport = two_page_transport();
    let acquirer = Acquirer::new(params(dir.path(), ProviderKind::PlanetScenes, 1), &transport);
    acquirer.acquire(37.7749, -122.4194).expect("acquire");

    let requests = transport.json_requests.borrow();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, SEARCH);
    assert_eq!(requests[0].1.len(), 1);
    assert_eq!(requests[0].1[0].0, "intersects");
    assert!(requests[0].1[0].1.starts_with("POLYGON(("));
    // The cursor is used verbatim.
    assert_eq!(requests[1].0, "https://api.planet.com/v0/scenes/ortho/?page=2");
    assert!(requests[1].1.is_empty());
}

#[test]
fn existing_files_are_not_downloaded_again() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("s2.full.tif"), b"already here").expect("seed file");
    let transport = two_page_transport();
    let acquirer = Acquirer::new(params(dir.path(), ProviderKind::PlanetScenes, 1), &transport);

    let scenes = acquirer.acquire(37.7749, -122.4194).expect("acquire");
    assert_eq!(scenes.len(), 3);
    assert_eq!(
        *transport.downloads.borrow(),
        vec!["https://dl/scenes/s1/full", "https://dl/scenes/s3/full"]
    );
    assert_eq!(
        std::fs::read(dir.path().join("s2.full.tif")).expect("read"),
        b"already here"
    );
}

#[test]
fn corrupt_download_is_retried() {
    let dir = tempfile::tempdir().expect("tempdir");
    let transport = two_page_transport();
    transport
        .corrupt_first
        .borrow_mut()
        .insert("https://dl/scenes/s1/full".into(), 2);
    let acquirer = Acquirer::new(params(dir.path(), ProviderKind::PlanetScenes, 3), &transport);

    acquirer.acquire(37.7749, -122.4194).expect("acquire");
    let s1_downloads = transport
        .downloads
        .borrow()
        .iter()
        .filter(|u| u.ends_with("s1/full"))
        .count();
    assert_eq!(s1_downloads, 3);
    image::ImageReader::open(dir.path().join("s1.full.tif"))
        .expect("open")
        .with_guessed_format()
        .expect("guess")
        .into_dimensions()
        .expect("valid scene");
}

#[test]
fn permanently_bad_scene_exhausts_retries_and_leaves_no_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let transport = two_page_transport();
    transport
        .corrupt_first
        .borrow_mut()
        .insert("https://dl/scenes/s1/full".into(), usize::MAX);
    let acquirer = Acquirer::new(params(dir.path(), ProviderKind::PlanetScenes, 2), &transport);

    let err = acquirer.acquire(37.7749, -122.4194).expect_err("exhausted");
    match err {
        AcquireError::RetriesExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, AcquireError::InvalidScene { .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).expect("read dir").collect();
    assert!(leftovers.is_empty());
}

#[test]
fn analytic_scenes_go_through_the_band_transform() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut transport = FakeTransport::default();
    transport.pages.insert(
        "https://api.planet.com/v0/scenes/rapideye/".into(),
        json!({
            "features": [
                {"properties": {"data": {"products": {"analytic": {"full": "https://dl/rapideye/r1/analytic"}}}}}
            ],
            "_links": {"_next": null}
        }),
    );
    transport
        .files
        .insert("https://dl/rapideye/r1/analytic".into(), b"5 bands".to_vec());
    let runner = FakeRunner::default();
    let acquirer = Acquirer::with_runner(
        params(dir.path(), ProviderKind::PlanetAnalytic, 1),
        transport,
        &runner,
    );

    let scenes = acquirer.acquire(40.0, -105.0).expect("acquire");
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].path, dir.path().join("r1.analytic.tif"));
    assert_eq!(
        std::fs::read(&scenes[0].path).expect("read"),
        b"convert"
    );
    assert_eq!(
        *runner.programs.borrow(),
        vec!["gdal_translate", "gdalwarp", "convert"]
    );
    // Only the final scene remains.
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 1);
}
