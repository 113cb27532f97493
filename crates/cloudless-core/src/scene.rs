use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Imagery provider the scene was acquired from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Orthorectified visual scenes, delivered ready to use.
    #[default]
    PlanetScenes,
    /// Multi-band analytic products that need a band/contrast transform.
    PlanetAnalytic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::PlanetScenes, ProviderKind::PlanetAnalytic];

    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::PlanetScenes => "planet_scenes",
            ProviderKind::PlanetAnalytic => "planet_analytic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| {
                format!("unknown provider {s:?} (expected planet_scenes or planet_analytic)")
            })
    }
}

/// A raw raster downloaded from a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub url: String,
    pub path: PathBuf,
    pub provider: ProviderKind,
}

/// A square tile cut out of a scene at pixel offset `(x, y)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Base name of the parent raster.
    pub scene: String,
    pub x: u32,
    pub y: u32,
    pub size: u32,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse_back() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.name().parse::<ProviderKind>(), Ok(kind));
        }
        assert_eq!(
            "Planet-Analytic".parse::<ProviderKind>(),
            Ok(ProviderKind::PlanetAnalytic)
        );
        assert!("landsat".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn provider_serializes_as_snake_case() {
        let json = serde_json::to_string(&ProviderKind::PlanetAnalytic).expect("json");
        assert_eq!(json, "\"planet_analytic\"");
    }
}
