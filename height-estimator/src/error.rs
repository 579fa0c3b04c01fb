use coordinate_transformer::ProjectionError;
use tank_core::ModelError;

use crate::statistic::HeightStatistic;

#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("no valid points left for the {statistic} statistic")]
    EmptySelection { statistic: HeightStatistic },
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Model(#[from] ModelError),
}
