use tank_core::lidar::LidarPoint;

pub mod no_data;
pub mod threshold;

pub use no_data::NoDataFilter;
pub use threshold::ZThresholdFilter;

pub trait PointFilter {
    fn filter(&self, points: Vec<LidarPoint>) -> Vec<LidarPoint>;
}

/// Applies its filters in order; each sees only what the previous one kept.
pub struct CompositeFilter {
    filters: Vec<Box<dyn PointFilter>>,
}

impl CompositeFilter {
    pub fn new(filters: Vec<Box<dyn PointFilter>>) -> Self {
        Self { filters }
    }
}

impl PointFilter for CompositeFilter {
    fn filter(&self, points: Vec<LidarPoint>) -> Vec<LidarPoint> {
        self.filters
            .iter()
            .fold(points, |intermediate, filter| filter.filter(intermediate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistic::ZThreshold;
    use tank_core::NO_DATA;

    fn point(z: f64, bee: f64) -> LidarPoint {
        LidarPoint {
            x: 0.0,
            y: 0.0,
            z,
            bare_earth_elevation: Some(bee),
        }
    }

    #[test]
    fn no_data_is_removed_before_the_threshold_is_computed() {
        // Thresholding first would cut at 3.0 and keep only sentinel points.
        let points = vec![
            point(1.0, 0.0),
            point(2.0, 0.0),
            point(3.0, 0.0),
            point(4.0, NO_DATA),
            point(5.0, NO_DATA),
        ];
        let composite = CompositeFilter::new(vec![
            Box::new(NoDataFilter),
            Box::new(ZThresholdFilter::new(ZThreshold::Quantile(0.5))),
        ]);
        let kept = composite.filter(points);
        assert_eq!(kept, vec![point(3.0, 0.0)]);
    }
}
