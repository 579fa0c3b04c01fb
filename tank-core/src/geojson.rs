//! Minimal GeoJSON model.
//!
//! Only the parts this pipeline reads are typed. Geometry and any foreign
//! members are carried through as raw JSON so that rewriting a file keeps
//! everything the upstream stages put there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features: Vec::new(),
            foreign_members: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Option<Value>, properties: Map<String, Value>) -> Self {
        Self {
            kind: "Feature".to_string(),
            id: None,
            geometry,
            properties,
            foreign_members: Map::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }

    /// Finite numeric property. Numbers stored as strings are accepted too.
    pub fn f64_property(&self, name: &str) -> Option<f64> {
        let value = match self.property(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        value.filter(|v: &f64| v.is_finite())
    }

    pub fn str_property(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(Value::as_str)
    }

    pub fn set_property(&mut self, name: &str, value: Value) {
        self.properties.insert(name.to_string(), value);
    }

    /// Removes a property without reordering the others.
    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }
}

/// `"properties": null` is valid GeoJSON.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn foreign_members_survive_a_round_trip() {
        let doc = json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:OGC:1.3:CRS84" } },
            "features": [{
                "type": "Feature",
                "id": "0",
                "bbox": [0.0, 0.0, 1.0, 1.0],
                "geometry": { "type": "Point", "coordinates": [0.5, 0.5] },
                "properties": { "b": 1, "a": "x" }
            }]
        });

        let fc: FeatureCollection = serde_json::from_value(doc.clone()).unwrap();
        assert!(fc.foreign_members.contains_key("crs"));
        assert!(fc.features[0].foreign_members.contains_key("bbox"));
        assert_eq!(serde_json::to_value(&fc).unwrap(), doc);
    }

    #[test]
    fn null_properties_become_empty() {
        let f: Feature = serde_json::from_value(json!({
            "type": "Feature", "geometry": null, "properties": null
        }))
        .unwrap();
        assert!(f.properties.is_empty());
        assert!(f.geometry.is_none());
    }

    #[test]
    fn numeric_strings_are_read_as_numbers() {
        let mut f = Feature::new(None, Map::new());
        f.set_property("z", json!("12.5"));
        f.set_property("n", Value::Null);
        f.set_property("nan", json!("NaN"));
        f.set_property("inf", json!(" inf"));
        assert_eq!(f.f64_property("z"), Some(12.5));
        assert_eq!(f.f64_property("n"), None);
        assert_eq!(f.f64_property("nan"), None);
        assert_eq!(f.f64_property("inf"), None);
    }
}
