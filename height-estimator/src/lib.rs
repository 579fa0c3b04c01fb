pub mod builder;
pub mod error;
pub mod filter;
pub mod merge;
pub mod runner;
pub mod sampling;
pub mod statistic;

pub use builder::FilterBuilder;
pub use error::EstimateError;
pub use runner::{HeightEstimate, HeightEstimator, HeightSummary};
pub use statistic::{HeightStatistic, ZThreshold};
