//! Per-provider response schemas.

use crate::AcquireError;
use cloudless_core::ProviderKind;
use log::warn;
use serde_json::Value;

const SCENES_URL: &str = "https://api.planet.com/v0/scenes/ortho/";
const ANALYTIC_URL: &str = "https://api.planet.com/v0/scenes/rapideye/";

/// How a provider's search endpoint is queried and its pages are read.
///
/// The pagination loop in [`crate::Acquirer`] is shared; only the field
/// layout differs between providers.
pub trait SceneProvider {
    /// Endpoint of the first search request.
    fn search_url(&self) -> &'static str;

    /// Download links of every scene on one result page.
    fn scene_links(&self, page: &Value) -> Result<Vec<String>, AcquireError>;

    /// Cursor URL of the next page, `None` on the last page.
    fn next_page(&self, page: &Value) -> Option<String>;

    /// Whether downloads need the band/contrast transform before use.
    fn needs_band_transform(&self) -> bool;
}

impl SceneProvider for ProviderKind {
    fn search_url(&self) -> &'static str {
        match self {
            ProviderKind::PlanetScenes => SCENES_URL,
            ProviderKind::PlanetAnalytic => ANALYTIC_URL,
        }
    }

    fn scene_links(&self, page: &Value) -> Result<Vec<String>, AcquireError> {
        let features = page
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| AcquireError::MalformedPage("missing `features` array".into()))?;
        let pointer = match self {
            ProviderKind::PlanetScenes => "/properties/links/full",
            ProviderKind::PlanetAnalytic => "/properties/data/products/analytic/full",
        };

        let mut links = Vec::with_capacity(features.len());
        for (idx, feature) in features.iter().enumerate() {
            match feature.pointer(pointer).and_then(Value::as_str) {
                Some(link) => links.push(link.to_string()),
                None => warn!("{self}: feature {idx} has no link at {pointer}, skipping"),
            }
        }
        Ok(links)
    }

    fn next_page(&self, page: &Value) -> Option<String> {
        let pointer = match self {
            ProviderKind::PlanetScenes => "/links/next",
            ProviderKind::PlanetAnalytic => "/_links/_next",
        };
        page.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn needs_band_transform(&self) -> bool {
        matches!(self, ProviderKind::PlanetAnalytic)
    }
}

/// Local file name for a scene URL.
///
/// The last two non-empty path segments joined by `.`, so
/// `.../ortho/20150101_scene/full?product=visual` becomes
/// `20150101_scene.full.tif`. `.tif` is appended when missing.
pub fn canonical_file_name(url: &str) -> Result<String, AcquireError> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let path = match without_query.split_once("://") {
        // Drop the host.
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or_default(),
        None => without_query,
    };
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    if segments.is_empty() {
        return Err(AcquireError::MalformedUrl(url.to_string()));
    }

    let tail = &segments[segments.len().saturating_sub(2)..];
    let mut name = tail.join(".");
    if !name.to_ascii_lowercase().ends_with(".tif") {
        name.push_str(".tif");
    }
    Ok(name)
}
