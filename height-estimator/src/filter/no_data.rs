use tank_core::lidar::LidarPoint;

use super::PointFilter;

/// Drops points whose height difference cannot be computed.
pub struct NoDataFilter;

impl PointFilter for NoDataFilter {
    fn filter(&self, points: Vec<LidarPoint>) -> Vec<LidarPoint> {
        let before = points.len();
        let kept: Vec<_> = points
            .into_iter()
            .filter(|p| p.lpc_bee_difference().is_some())
            .collect();
        if kept.len() < before {
            log::debug!("dropped {} no-data points", before - kept.len());
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_core::NO_DATA;

    #[test]
    fn sentinel_and_missing_values_are_dropped() {
        let base = LidarPoint {
            x: 0.0,
            y: 0.0,
            z: 5.0,
            bare_earth_elevation: Some(1.0),
        };
        let points = vec![
            base,
            LidarPoint {
                bare_earth_elevation: Some(NO_DATA),
                ..base
            },
            LidarPoint {
                bare_earth_elevation: None,
                ..base
            },
            LidarPoint { z: NO_DATA, ..base },
        ];
        assert_eq!(NoDataFilter.filter(points), vec![base]);
    }
}
