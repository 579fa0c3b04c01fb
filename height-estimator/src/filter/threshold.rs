use tank_core::lidar::LidarPoint;

use super::PointFilter;
use crate::statistic::ZThreshold;

/// Keeps points with Z strictly above a cut-off computed from the Z values
/// of its own input.
pub struct ZThresholdFilter {
    threshold: ZThreshold,
}

impl ZThresholdFilter {
    pub fn new(threshold: ZThreshold) -> Self {
        Self { threshold }
    }
}

impl PointFilter for ZThresholdFilter {
    fn filter(&self, points: Vec<LidarPoint>) -> Vec<LidarPoint> {
        let z: Vec<f64> = points.iter().map(|p| p.z).collect();
        let Some(cut) = self.threshold.value(&z) else {
            return points;
        };
        points.into_iter().filter(|p| p.z > cut).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(z: &[f64]) -> Vec<LidarPoint> {
        z.iter()
            .map(|&z| LidarPoint {
                x: 0.0,
                y: 0.0,
                z,
                bare_earth_elevation: Some(0.0),
            })
            .collect()
    }

    fn z_of(points: &[LidarPoint]) -> Vec<f64> {
        points.iter().map(|p| p.z).collect()
    }

    #[test]
    fn comparison_is_strict() {
        let kept = ZThresholdFilter::new(ZThreshold::Quantile(0.5))
            .filter(points(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(z_of(&kept), vec![4.0, 5.0]);
    }

    #[test]
    fn constant_z_leaves_nothing() {
        let kept = ZThresholdFilter::new(ZThreshold::Mean).filter(points(&[10.0; 5]));
        assert!(kept.is_empty());
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(ZThresholdFilter::new(ZThreshold::Quantile(0.9))
            .filter(Vec::new())
            .is_empty());
    }
}
