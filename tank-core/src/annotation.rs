use serde_json::Value;

use crate::{
    geojson::{Feature, FeatureCollection},
    tank::TankId,
};

/// Default file name of the tile-level annotation dataset inside its directory.
pub const ANNOTATION_FILE_NAME: &str = "tile_level_annotations.geojson";
pub const DEFAULT_ID_PROPERTY: &str = "id";
pub const DEFAULT_HEIGHT_PROPERTY: &str = "height_estimate";

/// The tile-level annotation dataset: every detected tank with its geometry
/// and attributes.
#[derive(Debug, Clone)]
pub struct AnnotationDataset {
    pub collection: FeatureCollection,
    id_property: String,
}

impl AnnotationDataset {
    pub fn new(collection: FeatureCollection, id_property: impl Into<String>) -> Self {
        Self {
            collection,
            id_property: id_property.into(),
        }
    }

    pub fn id_property(&self) -> &str {
        &self.id_property
    }

    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    /// ID of a feature: the configured property first, then the top-level
    /// GeoJSON `id` member.
    pub fn feature_id(&self, feature: &Feature) -> Option<TankId> {
        feature
            .property(&self.id_property)
            .and_then(TankId::from_json)
            .or_else(|| feature.id.as_ref().and_then(TankId::from_json))
    }

    pub fn contains(&self, tank_id: &TankId) -> bool {
        self.collection
            .features
            .iter()
            .any(|f| self.feature_id(f).as_ref() == Some(tank_id))
    }

    fn matching(&self, tank_id: &TankId) -> Vec<usize> {
        self.collection
            .features
            .iter()
            .enumerate()
            .filter(|(_, f)| self.feature_id(f).as_ref() == Some(tank_id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Sets `name` on every feature whose ID equals `tank_id`. Returns how
    /// many features were updated.
    pub fn set_attribute(&mut self, tank_id: &TankId, name: &str, value: Value) -> usize {
        let matching = self.matching(tank_id);
        for &i in &matching {
            self.collection.features[i].set_property(name, value.clone());
        }
        matching.len()
    }

    /// Drops `name` from every feature whose ID equals `tank_id`. Returns how
    /// many features carried it.
    pub fn remove_attribute(&mut self, tank_id: &TankId, name: &str) -> usize {
        let mut removed = 0;
        for i in self.matching(tank_id) {
            if self.collection.features[i].remove_property(name).is_some() {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> AnnotationDataset {
        let fc: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null, "properties": { "id": "1", "object_class": "closed_roof_tank" } },
                { "type": "Feature", "geometry": null, "properties": { "id": 2 } },
                { "type": "Feature", "id": 3, "geometry": null, "properties": {} }
            ]
        }))
        .unwrap();
        AnnotationDataset::new(fc, DEFAULT_ID_PROPERTY)
    }

    #[test]
    fn ids_resolve_from_property_or_member() {
        let ds = dataset();
        assert!(ds.contains(&TankId::new("1")));
        assert!(ds.contains(&TankId::new("2")));
        assert!(ds.contains(&TankId::new("3")));
        assert!(!ds.contains(&TankId::new("7")));
    }

    #[test]
    fn set_attribute_touches_only_matching_features() {
        let mut ds = dataset();
        let n = ds.set_attribute(&TankId::new("2"), DEFAULT_HEIGHT_PROPERTY, json!(11.5));
        assert_eq!(n, 1);
        assert_eq!(
            ds.collection.features[1].f64_property(DEFAULT_HEIGHT_PROPERTY),
            Some(11.5)
        );
        assert!(ds.collection.features[0]
            .property(DEFAULT_HEIGHT_PROPERTY)
            .is_none());
    }

    #[test]
    fn remove_attribute_keeps_column_order() {
        let mut ds = dataset();
        ds.set_attribute(&TankId::new("1"), DEFAULT_HEIGHT_PROPERTY, json!(4.0));
        ds.set_attribute(&TankId::new("1"), "note", json!("x"));

        assert_eq!(ds.remove_attribute(&TankId::new("1"), DEFAULT_HEIGHT_PROPERTY), 1);
        assert_eq!(ds.remove_attribute(&TankId::new("2"), DEFAULT_HEIGHT_PROPERTY), 0);
        let keys: Vec<_> = ds.collection.features[0].properties.keys().collect();
        assert_eq!(keys, vec!["id", "object_class", "note"]);
    }
}
