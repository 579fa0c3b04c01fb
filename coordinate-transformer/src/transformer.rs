use std::{fmt, path::Path};

use proj_sys_transformer::{Direction, ProjTransformer};

use crate::error::ProjectionError;

/// WGS84 geographic 2D, the CRS lidar and annotation coordinates are stored in.
pub const EPSG_WGS84_GEOGRAPHIC: &str = "EPSG:4326";

/// A CRS definition as PROJ understands it (`EPSG:xxxx`, a PROJ string or WKT).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    pub fn new(definition: impl Into<String>) -> Self {
        Self(definition.into().trim().to_string())
    }

    pub fn from_epsg(code: u16) -> Self {
        Self(format!("EPSG:{code}"))
    }

    pub fn wgs84() -> Self {
        Self::new(EPSG_WGS84_GEOGRAPHIC)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Textual comparison ignoring ASCII case; no CRS equivalence lookup.
    fn same_as(&self, other: &Crs) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Crs {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

pub enum CoordTransformer {
    Identity,
    Proj(ProjTransformer),
}

impl CoordTransformer {
    pub fn new(
        source: &Crs,
        target: &Crs,
        proj_data_dir: Option<&Path>,
    ) -> Result<Self, ProjectionError> {
        if source.same_as(target) {
            return Ok(Self::Identity);
        }

        let t = ProjTransformer::new(source.as_str(), target.as_str(), proj_data_dir).map_err(
            |inner| ProjectionError::Build {
                source_crs: source.to_string(),
                target_crs: target.to_string(),
                inner,
            },
        )?;
        Ok(Self::Proj(t))
    }

    /// Source to target. Order and count are preserved; `coords` is untouched.
    pub fn forward(&mut self, coords: &[(f64, f64)]) -> Result<Vec<(f64, f64)>, ProjectionError> {
        self.run(Direction::Forward, coords)
    }

    /// Target back to source.
    pub fn inverse(&mut self, coords: &[(f64, f64)]) -> Result<Vec<(f64, f64)>, ProjectionError> {
        self.run(Direction::Inverse, coords)
    }

    fn run(
        &mut self,
        direction: Direction,
        coords: &[(f64, f64)],
    ) -> Result<Vec<(f64, f64)>, ProjectionError> {
        match self {
            Self::Identity => Ok(coords.to_vec()),
            Self::Proj(t) => {
                let (mut xs, mut ys): (Vec<f64>, Vec<f64>) = coords.iter().copied().unzip();
                t.transform_xy_in_place(direction, &mut xs, &mut ys)?;
                Ok(xs.into_iter().zip(ys).collect())
            }
        }
    }
}

/// One-shot reprojection of `coords` from `source` to `target`.
pub fn reproject(
    source: &Crs,
    target: &Crs,
    coords: &[(f64, f64)],
) -> Result<Vec<(f64, f64)>, ProjectionError> {
    CoordTransformer::new(source, target, None)?.forward(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSG_WGS84_UTM_14N: u16 = 32614;

    #[test]
    fn identity_transform() {
        let mut transformer = CoordTransformer::new(&Crs::wgs84(), &Crs::wgs84(), None).unwrap();
        let input = vec![(1.0, 2.0), (3.0, 4.0)];
        let output = transformer.forward(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn epsg_prefix_case_is_ignored() {
        let t = CoordTransformer::new(&Crs::new("epsg:4326"), &Crs::wgs84(), None).unwrap();
        assert!(matches!(t, CoordTransformer::Identity));
    }

    #[test]
    fn round_trip_returns_original_coordinates() {
        let utm = Crs::from_epsg(EPSG_WGS84_UTM_14N);
        let mut transformer = CoordTransformer::new(&Crs::wgs84(), &utm, None).unwrap();
        let input = vec![(-99.1, 29.9), (-98.75, 30.2), (-98.0, 31.0)];

        let projected = transformer.forward(&input).unwrap();
        assert_eq!(projected.len(), input.len());
        // axis order stays easting, northing
        assert!(projected[0].0 < 1_000_000.0);
        assert!(projected[0].1 > 3_000_000.0);

        let back = transformer.inverse(&projected).unwrap();
        for ((x0, y0), (x1, y1)) in input.iter().zip(back.iter()) {
            assert!((x0 - x1).abs() < 1e-7);
            assert!((y0 - y1).abs() < 1e-7);
        }
    }

    #[test]
    fn out_of_domain_coordinate_fails() {
        let utm = Crs::from_epsg(EPSG_WGS84_UTM_14N);
        let result = reproject(&Crs::wgs84(), &utm, &[(-99.0, 30.0), (0.0, 95.0)]);
        assert!(matches!(result, Err(ProjectionError::Transform(_))));
    }

    #[test]
    fn unknown_crs_fails_to_build() {
        let result = CoordTransformer::new(&Crs::wgs84(), &Crs::new("EPSG:0"), None);
        assert!(matches!(result, Err(ProjectionError::Build { .. })));
    }
}
