//! Search-area geometry: point → metric buffer → lon/lat polygon.
//!
//! Buffering happens in a projected, metre-based CRS so that a buffer of
//! `r` metres is a square of side `2r` regardless of latitude. The envelope
//! is projected back vertex by vertex, so in lon/lat the ring is only
//! approximately rectangular.

use crate::AcquireError;
use nalgebra::Point2;
use std::fmt::Write as _;

/// A forward/inverse map between lon/lat degrees and planar metres.
pub trait Projection {
    /// `(lon, lat)` in degrees to `(x, y)` in metres.
    fn forward(&self, lon_lat: Point2<f64>) -> Point2<f64>;
    /// `(x, y)` in metres to `(lon, lat)` in degrees.
    fn inverse(&self, xy: Point2<f64>) -> Point2<f64>;
}

/// Spherical Lambert azimuthal equal-area projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LambertAzimuthalEqualArea {
    radius: f64,
    lat0: f64,
    lon0: f64,
}

impl LambertAzimuthalEqualArea {
    /// Centre given in degrees, radius in metres.
    pub fn new(radius: f64, lat0_deg: f64, lon0_deg: f64) -> Self {
        Self {
            radius,
            lat0: lat0_deg.to_radians(),
            lon0: lon0_deg.to_radians(),
        }
    }

    /// US National Atlas Equal Area (EPSG:2163).
    pub fn national_atlas() -> Self {
        Self::new(6_370_997.0, 45.0, -100.0)
    }
}

impl Default for LambertAzimuthalEqualArea {
    fn default() -> Self {
        Self::national_atlas()
    }
}

impl Projection for LambertAzimuthalEqualArea {
    fn forward(&self, lon_lat: Point2<f64>) -> Point2<f64> {
        let lon = lon_lat.x.to_radians();
        let lat = lon_lat.y.to_radians();
        let dlon = lon - self.lon0;
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lat0, cos_lat0) = self.lat0.sin_cos();
        let denom = 1.0 + sin_lat0 * sin_lat + cos_lat0 * cos_lat * dlon.cos();
        // Antipode of the centre; never reached for realistic inputs.
        if denom <= f64::EPSILON {
            return Point2::new(f64::NAN, f64::NAN);
        }
        let k = (2.0 / denom).sqrt();
        Point2::new(
            self.radius * k * cos_lat * dlon.sin(),
            self.radius * k * (cos_lat0 * sin_lat - sin_lat0 * cos_lat * dlon.cos()),
        )
    }

    fn inverse(&self, xy: Point2<f64>) -> Point2<f64> {
        let rho = (xy.x * xy.x + xy.y * xy.y).sqrt();
        if rho < 1e-9 {
            return Point2::new(self.lon0.to_degrees(), self.lat0.to_degrees());
        }
        let c = 2.0 * (rho / (2.0 * self.radius)).clamp(-1.0, 1.0).asin();
        let (sin_c, cos_c) = c.sin_cos();
        let (sin_lat0, cos_lat0) = self.lat0.sin_cos();
        let lat = (cos_c * sin_lat0 + xy.y * sin_c * cos_lat0 / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lon = self.lon0 + (xy.x * sin_c).atan2(rho * cos_lat0 * cos_c - xy.y * sin_lat0 * sin_c);
        Point2::new(lon.to_degrees(), lat.to_degrees())
    }
}

/// Axis-aligned bounds in projected metres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Envelope of a disc of radius `buffer` around `centre`.
    pub fn around(centre: Point2<f64>, buffer: f64) -> Self {
        Self {
            min_x: centre.x - buffer,
            max_x: centre.x + buffer,
            min_y: centre.y - buffer,
            max_y: centre.y + buffer,
        }
    }

    /// Closed ring `(min,min) → (min,max) → (max,max) → (max,min) → (min,min)`.
    pub fn ring(&self) -> [Point2<f64>; 5] {
        [
            Point2::new(self.min_x, self.min_y),
            Point2::new(self.min_x, self.max_y),
            Point2::new(self.max_x, self.max_y),
            Point2::new(self.max_x, self.min_y),
            Point2::new(self.min_x, self.min_y),
        ]
    }
}

/// Closed lon/lat polygon used as the spatial filter of a scene search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchArea {
    /// Five vertices, `(lon, lat)` in degrees, first equals last.
    pub ring: Vec<Point2<f64>>,
}

impl SearchArea {
    /// Buffer `(lat, lng)` by `buffer_meters` in `projection` and map the
    /// envelope back to lon/lat.
    pub fn around(
        lat: f64,
        lng: f64,
        buffer_meters: f64,
        projection: &dyn Projection,
    ) -> Result<Self, AcquireError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(AcquireError::InvalidLocation(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(AcquireError::InvalidLocation(format!(
                "longitude {lng} outside [-180, 180]"
            )));
        }
        if !buffer_meters.is_finite() || buffer_meters <= 0.0 {
            return Err(AcquireError::InvalidLocation(format!(
                "buffer must be a positive distance, got {buffer_meters}"
            )));
        }

        let centre = projection.forward(Point2::new(lng, lat));
        if !centre.x.is_finite() || !centre.y.is_finite() {
            return Err(AcquireError::InvalidLocation(format!(
                "({lat}, {lng}) cannot be projected"
            )));
        }
        let ring = Envelope::around(centre, buffer_meters)
            .ring()
            .iter()
            .map(|p| projection.inverse(*p))
            .collect();
        Ok(Self { ring })
    }

    /// Well-known-text rendering, `POLYGON((lon lat, ...))`.
    pub fn to_wkt(&self) -> String {
        let mut out = String::from("POLYGON((");
        for (i, p) in self.ring.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{} {}", p.x, p.y);
        }
        out.push_str("))");
        out
    }

    /// Does the area contain `(lat, lng)`? Ray casting over the ring.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        let mut inside = false;
        for edge in self.ring.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            if (a.y > lat) != (b.y > lat) {
                let x_cross = a.x + (lat - a.y) * (b.x - a.x) / (b.y - a.y);
                if lng < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}
