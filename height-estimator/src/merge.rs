use std::collections::HashSet;

use serde_json::{Number, Value};
use tank_core::{annotation::AnnotationDataset, tank::TankId};

use crate::runner::HeightEstimate;

/// Outcome of merging estimates into the annotation dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Features that received a value.
    pub updated: usize,
    /// Features whose earlier value was dropped because their tank has no
    /// estimate this time.
    pub cleared: usize,
    /// Tanks with an estimate but no annotation feature.
    pub unmatched: Vec<TankId>,
}

/// Sets `column` to the unrounded estimate on every feature whose ID matches.
/// Features of the processed tanks that got no estimate lose any value an
/// earlier run left in `column`. Features of other tanks are not touched.
pub fn merge_heights<'a>(
    annotations: &mut AnnotationDataset,
    processed: &[TankId],
    estimates: impl IntoIterator<Item = (&'a TankId, &'a HeightEstimate)>,
    column: &str,
) -> MergeReport {
    let mut report = MergeReport::default();
    let estimates: Vec<_> = estimates.into_iter().collect();
    let estimated: HashSet<&TankId> = estimates.iter().map(|(id, _)| *id).collect();

    for tank_id in processed.iter().filter(|id| !estimated.contains(id)) {
        let n = annotations.remove_attribute(tank_id, column);
        if n > 0 {
            log::debug!("tank {tank_id}: dropped the previous {column}");
            report.cleared += n;
        }
    }

    for (tank_id, estimate) in estimates {
        let Some(value) = Number::from_f64(estimate.value).map(Value::Number) else {
            log::warn!("tank {tank_id}: non-finite height {}, not merged", estimate.value);
            report.cleared += annotations.remove_attribute(tank_id, column);
            continue;
        };
        match annotations.set_attribute(tank_id, column, value) {
            0 => {
                log::warn!("tank {tank_id}: no annotation feature with this id");
                report.unmatched.push(tank_id.clone());
            }
            n => report.updated += n,
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistic::HeightStatistic;
    use serde_json::json;
    use tank_core::{annotation::DEFAULT_HEIGHT_PROPERTY, geojson::FeatureCollection};

    fn annotations() -> AnnotationDataset {
        let fc: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null, "properties": { "id": "1" } },
                { "type": "Feature", "geometry": null, "properties": { "id": "2", "height_estimate": 3.0 } },
                { "type": "Feature", "geometry": null, "properties": { "id": "3", "height_estimate": 8.0 } }
            ]
        }))
        .unwrap();
        AnnotationDataset::new(fc, "id")
    }

    fn estimate(value: f64) -> HeightEstimate {
        HeightEstimate {
            statistic: HeightStatistic::Median,
            value,
            points_used: 3,
        }
    }

    #[test]
    fn unknown_tank_leaves_dataset_unchanged() {
        let mut ds = annotations();
        let before = ds.collection.clone();
        let id = TankId::new("7");
        let e = estimate(12.0);
        let report = merge_heights(&mut ds, &[id.clone()], [(&id, &e)], DEFAULT_HEIGHT_PROPERTY);

        assert_eq!(report.updated, 0);
        assert_eq!(report.unmatched, vec![id]);
        assert_eq!(ds.collection, before);
    }

    #[test]
    fn processed_tank_without_estimate_loses_its_old_height() {
        let mut ds = annotations();
        let ids = [TankId::new("1"), TankId::new("2")];
        let e = estimate(12.345678);
        let report = merge_heights(&mut ds, &ids, [(&ids[0], &e)], DEFAULT_HEIGHT_PROPERTY);

        assert_eq!(report.updated, 1);
        assert_eq!(report.cleared, 1);
        assert_eq!(
            ds.collection.features[0].f64_property(DEFAULT_HEIGHT_PROPERTY),
            Some(12.345678)
        );
        assert!(ds.collection.features[1]
            .property(DEFAULT_HEIGHT_PROPERTY)
            .is_none());
        // not processed in this run
        assert_eq!(
            ds.collection.features[2].f64_property(DEFAULT_HEIGHT_PROPERTY),
            Some(8.0)
        );
    }
}
