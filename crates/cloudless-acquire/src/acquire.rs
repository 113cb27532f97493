use crate::{
    band_transform, canonical_file_name, AcquireError, CommandRunner, HttpTransport,
    LambertAzimuthalEqualArea, Projection, RetryPolicy, SceneProvider, SearchArea, SystemRunner,
    UreqTransport,
};
use cloudless_core::{ProviderKind, Scene};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of one acquisition run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquireParams {
    pub download_dir: PathBuf,
    pub buffer_meters: f64,
    pub provider: ProviderKind,
    pub retry: RetryPolicy,
}

impl Default for AcquireParams {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("data/planetlab/raw"),
            buffer_meters: 200.0,
            provider: ProviderKind::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Searches a provider around a point and downloads every matching scene.
pub struct Acquirer<T, R = SystemRunner> {
    params: AcquireParams,
    transport: T,
    runner: R,
    projection: Box<dyn Projection>,
}

impl<T: HttpTransport> Acquirer<T, SystemRunner> {
    pub fn new(params: AcquireParams, transport: T) -> Self {
        Self::with_runner(params, transport, SystemRunner)
    }
}

impl<T: HttpTransport, R: CommandRunner> Acquirer<T, R> {
    pub fn with_runner(params: AcquireParams, transport: T, runner: R) -> Self {
        Self {
            params,
            transport,
            runner,
            projection: Box::new(LambertAzimuthalEqualArea::national_atlas()),
        }
    }

    /// Replace the metric projection used for buffering.
    pub fn with_projection(mut self, projection: impl Projection + 'static) -> Self {
        self.projection = Box::new(projection);
        self
    }

    pub fn params(&self) -> &AcquireParams {
        &self.params
    }

    /// Download every scene intersecting the buffered point.
    ///
    /// Scenes already present in the download directory are reused without
    /// a request.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self), fields(provider = %self.params.provider))
    )]
    pub fn acquire(&self, lat: f64, lng: f64) -> Result<Vec<Scene>, AcquireError> {
        let provider = self.params.provider;
        let area = SearchArea::around(lat, lng, self.params.buffer_meters, self.projection.as_ref())?;
        let wkt = area.to_wkt();
        info!("searching {provider} within {wkt}");

        fs::create_dir_all(&self.params.download_dir)?;
        let mut scenes = Vec::new();
        let mut page = self
            .transport
            .get_json(provider.search_url(), &[("intersects", wkt.as_str())])?;
        let mut page_no = 1;
        loop {
            let links = provider.scene_links(&page)?;
            debug!("page {page_no}: {} scenes", links.len());
            for link in links {
                scenes.push(self.fetch_scene(&link)?);
            }
            match provider.next_page(&page) {
                Some(next) => {
                    page = self.transport.get_json(&next, &[])?;
                    page_no += 1;
                }
                None => break,
            }
        }

        info!("{} scenes available in {}", scenes.len(), self.params.download_dir.display());
        Ok(scenes)
    }

    fn fetch_scene(&self, url: &str) -> Result<Scene, AcquireError> {
        let name = canonical_file_name(url)?;
        let dest = self.params.download_dir.join(&name);
        let scene = Scene {
            url: url.to_string(),
            path: dest.clone(),
            provider: self.params.provider,
        };
        if dest.exists() {
            info!("{} already downloaded, skipping", dest.display());
            return Ok(scene);
        }

        info!("downloading {url}");
        self.params
            .retry
            .run(url, |_| self.try_fetch(url, &name, &dest))?;
        Ok(scene)
    }

    /// One attempt. The final file only appears once everything succeeded.
    fn try_fetch(&self, url: &str, name: &str, dest: &Path) -> Result<(), AcquireError> {
        let dir = &self.params.download_dir;
        let part = dir.join(format!(".{name}.part"));
        let processed = dir.join(format!(".{name}.processed.tif"));

        let result = self.download_and_process(url, &part, &processed, dest);
        remove_if_exists(&part)?;
        remove_if_exists(&processed)?;
        result
    }

    fn download_and_process(
        &self,
        url: &str,
        part: &Path,
        processed: &Path,
        dest: &Path,
    ) -> Result<(), AcquireError> {
        let bytes = self.transport.download(url, part)?;
        debug!("{url}: {bytes} bytes");

        if self.params.provider.needs_band_transform() {
            band_transform(&self.runner, part, processed)?;
            fs::rename(processed, dest)?;
        } else {
            validate_raster(part)?;
            fs::rename(part, dest)?;
        }
        Ok(())
    }
}

/// A truncated or corrupt download cannot even report its dimensions.
fn validate_raster(path: &Path) -> Result<(u32, u32), AcquireError> {
    let invalid = |message: String| AcquireError::InvalidScene {
        path: path.to_path_buf(),
        message,
    };
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| invalid(e.to_string()))
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Search and download with the default HTTP client, key from `PLANET_KEY`.
pub fn acquire(
    lat: f64,
    lng: f64,
    buffer_meters: f64,
    provider: ProviderKind,
    download_dir: impl Into<PathBuf>,
) -> Result<Vec<Scene>, AcquireError> {
    let params = AcquireParams {
        download_dir: download_dir.into(),
        buffer_meters,
        provider,
        ..AcquireParams::default()
    };
    Acquirer::new(params, UreqTransport::from_env()?).acquire(lat, lng)
}
