mod error;
mod transformer;

pub use error::ProjectionError;
pub use transformer::{reproject, Crs, CoordTransformer, EPSG_WGS84_GEOGRAPHIC};
