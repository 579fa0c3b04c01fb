use crate::{
    filter::{CompositeFilter, NoDataFilter, PointFilter, ZThresholdFilter},
    statistic::HeightStatistic,
};

pub trait FilterBuilder {
    fn build(&self) -> Box<dyn PointFilter>;
}

/// No-data removal always runs first, then the statistic's Z cut-off.
impl FilterBuilder for HeightStatistic {
    fn build(&self) -> Box<dyn PointFilter> {
        let mut filters: Vec<Box<dyn PointFilter>> = vec![Box::new(NoDataFilter)];
        if let Some(threshold) = self.threshold() {
            filters.push(Box::new(ZThresholdFilter::new(threshold)));
        }
        Box::new(CompositeFilter::new(filters))
    }
}
