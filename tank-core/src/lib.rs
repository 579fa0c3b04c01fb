pub mod annotation;
pub mod error;
pub mod geojson;
pub mod lidar;
pub mod raster;
pub mod tank;

pub use error::ModelError;

/// Reserved value marking an invalid or missing elevation sample.
pub const NO_DATA: f64 = -999999.0;

/// Exact comparison; the sentinel is written verbatim, never computed.
#[inline]
pub fn is_no_data(value: f64) -> bool {
    value == NO_DATA
}
