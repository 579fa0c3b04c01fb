use coordinate_transformer::{reproject, Crs};
use tank_core::{lidar::LidarDataset, raster::DemRaster, NO_DATA};

use crate::error::EstimateError;

/// Samples a DEM under lidar points stored in `lidar_crs`.
#[derive(Debug, Clone)]
pub struct BareEarthSampler {
    lidar_crs: Crs,
}

impl BareEarthSampler {
    pub fn new(lidar_crs: Crs) -> Self {
        Self { lidar_crs }
    }

    pub fn lidar_crs(&self) -> &Crs {
        &self.lidar_crs
    }

    /// Raw DEM values under `coords`, in input order. Points are moved into
    /// the DEM's CRS first when it declares one.
    pub fn sample(
        &self,
        dem: &DemRaster,
        coords: &[(f64, f64)],
    ) -> Result<Vec<f64>, EstimateError> {
        let values = match dem.epsg {
            Some(code) => {
                let projected = reproject(&self.lidar_crs, &Crs::from_epsg(code), coords)?;
                dem.sample_many(&projected)?
            }
            None => dem.sample_many(coords)?,
        };
        Ok(values)
    }

    /// Writes `bare_earth_elevation` onto every record. Raster no-data,
    /// whatever the file declared, is stored as [`NO_DATA`].
    pub fn augment(&self, lidar: &mut LidarDataset, dem: &DemRaster) -> Result<(), EstimateError> {
        let elevations: Vec<f64> = self
            .sample(dem, &lidar.xy())?
            .into_iter()
            .map(|v| if dem.is_no_data(v) { NO_DATA } else { v })
            .collect();
        lidar.set_bare_earth_elevation(&elevations)?;

        let missing = elevations.iter().filter(|v| **v == NO_DATA).count();
        if missing > 0 {
            log::debug!("{missing} of {} points fell on DEM no-data", elevations.len());
        }
        Ok(())
    }
}
