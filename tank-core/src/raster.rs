//! Single-band DEM raster with a GDAL-style affine geotransform.

use crate::{error::ModelError, NO_DATA};

/// Affine pixel-to-world transform in GDAL coefficient order:
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// `col`/`row` are fractional pixel positions measured from the top-left
/// corner of the top-left pixel, so a north-up raster has a negative
/// `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_height: c[5],
        }
    }

    /// North-up transform from the top-left corner and the cell size.
    pub fn north_up(origin_x: f64, origin_y: f64, res_x: f64, res_y: f64) -> Self {
        Self::from_gdal([origin_x, res_x, 0.0, origin_y, 0.0, -res_y.abs()])
    }

    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// Fractional (col, row) for a world coordinate.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Result<(f64, f64), ModelError> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det == 0.0 || !det.is_finite() {
            return Err(ModelError::SingularTransform);
        }
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;
        Ok((col, row))
    }
}

#[derive(Debug, Clone)]
pub struct DemRaster {
    width: usize,
    height: usize,
    /// Row-major, top row first.
    data: Vec<f64>,
    pub transform: GeoTransform,
    /// No-data value declared by the file, if any.
    pub declared_no_data: Option<f64>,
    /// EPSG code from the GeoTIFF key directory, if any.
    pub epsg: Option<u16>,
}

impl DemRaster {
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<f64>,
        transform: GeoTransform,
    ) -> Result<Self, ModelError> {
        if data.len() != width * height {
            return Err(ModelError::RasterShape {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            transform,
            declared_no_data: None,
            epsg: None,
        })
    }

    pub fn with_no_data(mut self, value: Option<f64>) -> Self {
        self.declared_no_data = value;
        self
    }

    pub fn with_epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The value returned for missing or out-of-extent samples.
    pub fn no_data_value(&self) -> f64 {
        self.declared_no_data.unwrap_or(NO_DATA)
    }

    pub fn is_no_data(&self, value: f64) -> bool {
        value.is_nan() || value == self.no_data_value() || value == NO_DATA
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Value of the cell containing (x, y). Outside the extent, or on a
    /// no-data cell, returns [`Self::no_data_value`].
    pub fn sample(&self, x: f64, y: f64) -> Result<f64, ModelError> {
        let (col, row) = self.transform.world_to_pixel(x, y)?;
        let (col, row) = (col.floor(), row.floor());
        if !(col >= 0.0 && row >= 0.0 && col < self.width as f64 && row < self.height as f64) {
            return Ok(self.no_data_value());
        }
        let value = self.data[row as usize * self.width + col as usize];
        if self.is_no_data(value) {
            Ok(self.no_data_value())
        } else {
            Ok(value)
        }
    }

    /// One sample per coordinate, in input order.
    pub fn sample_many(&self, coords: &[(f64, f64)]) -> Result<Vec<f64>, ModelError> {
        coords.iter().map(|&(x, y)| self.sample(x, y)).collect()
    }

    /// World-space extent as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let corners = [
            self.transform.pixel_to_world(0.0, 0.0),
            self.transform.pixel_to_world(self.width as f64, 0.0),
            self.transform.pixel_to_world(0.0, self.height as f64),
            self.transform
                .pixel_to_world(self.width as f64, self.height as f64),
        ];
        corners.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Min and max over valid cells, `None` when every cell is no-data.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !self.is_no_data(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
