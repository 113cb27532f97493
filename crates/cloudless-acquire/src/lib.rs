//! Scene acquisition: search an imagery provider around a point and download
//! the matching rasters.
//!
//! The point is buffered in a metric projection ([`Projection`], by default
//! the US National Atlas equal-area projection), the envelope is mapped back
//! to lon/lat and sent as a WKT `intersects` filter. Result pages are
//! followed through the provider's cursor until it runs out. Each scene is
//! downloaded at most once per directory and retried with bounded backoff.
//!
//! ```no_run
//! use cloudless_acquire::{AcquireParams, Acquirer, UreqTransport};
//! use cloudless_core::ProviderKind;
//!
//! # fn main() -> Result<(), cloudless_acquire::AcquireError> {
//! let params = AcquireParams {
//!     provider: ProviderKind::PlanetScenes,
//!     ..AcquireParams::default()
//! };
//! let acquirer = Acquirer::new(params, UreqTransport::from_env()?);
//! for scene in acquirer.acquire(37.7749, -122.4194)? {
//!     println!("{}", scene.path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod acquire;
mod error;
mod geometry;
mod provider;
mod retry;
mod transform;
mod transport;

pub use acquire::{acquire, AcquireParams, Acquirer};
pub use error::AcquireError;
pub use geometry::{Envelope, LambertAzimuthalEqualArea, Projection, SearchArea};
pub use provider::{canonical_file_name, SceneProvider};
pub use retry::RetryPolicy;
pub use transform::{band_transform, CommandRunner, SystemRunner};
pub use transport::{HttpTransport, UreqTransport, API_KEY_VAR};
