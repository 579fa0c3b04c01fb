use tank_core::lidar::LidarPoint;

use crate::{
    builder::FilterBuilder,
    error::EstimateError,
    filter::PointFilter,
    statistic::{mean, HeightStatistic},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightEstimate {
    pub statistic: HeightStatistic,
    /// Mean `lpc_bee_difference` of the selected points, unrounded.
    pub value: f64,
    pub points_used: usize,
}

pub struct HeightEstimator {
    statistic: HeightStatistic,
    filter: Box<dyn PointFilter>,
}

impl HeightEstimator {
    pub fn new(statistic: HeightStatistic) -> Self {
        Self {
            statistic,
            filter: statistic.build(),
        }
    }

    pub fn statistic(&self) -> HeightStatistic {
        self.statistic
    }

    pub fn estimate(&self, points: &[LidarPoint]) -> Result<HeightEstimate, EstimateError> {
        let selected = self.filter.filter(points.to_vec());
        let differences: Vec<f64> = selected
            .iter()
            .filter_map(LidarPoint::lpc_bee_difference)
            .collect();
        let value = mean(&differences).ok_or(EstimateError::EmptySelection {
            statistic: self.statistic,
        })?;
        Ok(HeightEstimate {
            statistic: self.statistic,
            value,
            points_used: differences.len(),
        })
    }
}

/// Every statistic for one tank, as listed in the height report.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSummary {
    pub points: usize,
    pub valid_points: usize,
    /// In [`HeightStatistic::ALL`] order; `None` marks an empty selection.
    pub values: Vec<(HeightStatistic, Option<f64>)>,
}

impl HeightSummary {
    pub fn compute(points: &[LidarPoint]) -> Self {
        let values = HeightStatistic::ALL
            .into_iter()
            .map(|stat| {
                let value = HeightEstimator::new(stat)
                    .estimate(points)
                    .ok()
                    .map(|e| e.value);
                (stat, value)
            })
            .collect();
        Self {
            points: points.len(),
            valid_points: points
                .iter()
                .filter(|p| p.lpc_bee_difference().is_some())
                .count(),
            values,
        }
    }

    pub fn get(&self, statistic: HeightStatistic) -> Option<f64> {
        self.values
            .iter()
            .find(|(stat, _)| *stat == statistic)
            .and_then(|(_, value)| *value)
    }
}
