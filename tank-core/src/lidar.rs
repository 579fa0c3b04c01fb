use serde_json::Value;

use crate::{error::ModelError, geojson::FeatureCollection, is_no_data, NO_DATA};

pub const X_COLUMN: &str = "X coordinate";
pub const Y_COLUMN: &str = "Y coordinate";
pub const Z_COLUMN: &str = "Z coordinate";
pub const UTM_PROJECTION_COLUMN: &str = "utm_projection";
pub const OBJECT_CLASS_COLUMN: &str = "object_class";
pub const TILE_NAME_COLUMN: &str = "tile_name";
pub const MINX_PIXELS_COLUMN: &str = "minx_polygon_pixels";
pub const MINY_PIXELS_COLUMN: &str = "miny_polygon_pixels";
pub const MAXX_PIXELS_COLUMN: &str = "maxx_polygon_pixels";
pub const MAXY_PIXELS_COLUMN: &str = "maxy_polygon_pixels";
pub const BARE_EARTH_COLUMN: &str = "bare_earth_elevation";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidarPoint {
    /// Longitude (or easting, if the file is projected).
    pub x: f64,
    pub y: f64,
    /// Point-cloud surface elevation.
    pub z: f64,
    pub bare_earth_elevation: Option<f64>,
}

impl LidarPoint {
    /// `z - bare_earth_elevation`, or `None` when either side is no-data or
    /// not finite.
    pub fn lpc_bee_difference(&self) -> Option<f64> {
        let bee = self.bare_earth_elevation?;
        if is_no_data(bee) || is_no_data(self.z) || !bee.is_finite() || !self.z.is_finite() {
            return None;
        }
        Some(self.z - bee)
    }
}

/// Pixel bounding box of the tank inside its image tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

/// Per-tank attributes that every record repeats; taken from the first one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TankMetadata {
    pub utm_projection: Option<String>,
    pub object_class: Option<String>,
    pub tile_name: Option<String>,
    pub pixel_bounds: Option<PixelBounds>,
}

/// The lidar records of a single tank, with the source collection kept so
/// augmented records can be written back without losing columns.
#[derive(Debug, Clone)]
pub struct LidarDataset {
    pub collection: FeatureCollection,
    pub points: Vec<LidarPoint>,
    pub metadata: TankMetadata,
}

impl LidarDataset {
    pub fn from_collection(collection: FeatureCollection) -> Result<Self, ModelError> {
        if collection.features.is_empty() {
            return Err(ModelError::EmptyLidar);
        }

        let mut points = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.iter().enumerate() {
            let required = |name: &'static str| -> Result<f64, ModelError> {
                match feature.property(name) {
                    None => Err(ModelError::MissingProperty { index, name }),
                    Some(_) => feature
                        .f64_property(name)
                        .ok_or(ModelError::InvalidProperty {
                            index,
                            name,
                            expected: "number",
                        }),
                }
            };

            points.push(LidarPoint {
                x: required(X_COLUMN)?,
                y: required(Y_COLUMN)?,
                z: required(Z_COLUMN)?,
                bare_earth_elevation: feature.f64_property(BARE_EARTH_COLUMN),
            });
        }

        let first = &collection.features[0];
        let pixel = |name: &str| first.f64_property(name).map(|v| v.max(0.0) as u32);
        let pixel_bounds = match (
            pixel(MINX_PIXELS_COLUMN),
            pixel(MINY_PIXELS_COLUMN),
            pixel(MAXX_PIXELS_COLUMN),
            pixel(MAXY_PIXELS_COLUMN),
        ) {
            (Some(min_x), Some(min_y), Some(max_x), Some(max_y)) => Some(PixelBounds {
                min_x,
                min_y,
                max_x,
                max_y,
            }),
            _ => None,
        };
        let metadata = TankMetadata {
            utm_projection: first.str_property(UTM_PROJECTION_COLUMN).map(str::to_string),
            object_class: first.str_property(OBJECT_CLASS_COLUMN).map(str::to_string),
            tile_name: first.str_property(TILE_NAME_COLUMN).map(str::to_string),
            pixel_bounds,
        };

        Ok(Self {
            collection,
            points,
            metadata,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xy(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }

    /// Attaches one elevation per record, in record order. NaN is stored as
    /// the sentinel so the file never carries a non-JSON number.
    pub fn set_bare_earth_elevation(&mut self, elevations: &[f64]) -> Result<(), ModelError> {
        if elevations.len() != self.points.len() {
            return Err(ModelError::LengthMismatch {
                expected: self.points.len(),
                got: elevations.len(),
            });
        }
        for ((point, feature), &elevation) in self
            .points
            .iter_mut()
            .zip(self.collection.features.iter_mut())
            .zip(elevations)
        {
            let elevation = if elevation.is_nan() { NO_DATA } else { elevation };
            point.bare_earth_elevation = Some(elevation);
            let value = serde_json::Number::from_f64(elevation)
                .map(Value::Number)
                .unwrap_or(Value::Null);
            feature.set_property(BARE_EARTH_COLUMN, value);
        }
        Ok(())
    }

    pub fn valid_point_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.lpc_bee_difference().is_some())
            .count()
    }
}
