use std::{fs::File, io::BufReader, path::PathBuf};

use tank_core::{
    annotation::AnnotationDataset, geojson::FeatureCollection, lidar::LidarDataset,
};

use super::Parser;
use crate::error::ParseError;

pub fn read_feature_collection(path: &std::path::Path) -> Result<FeatureCollection, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ParseError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the per-tank lidar records.
pub struct LidarParser {
    pub filename: PathBuf,
}

impl Parser for LidarParser {
    type Output = LidarDataset;

    fn parse(&self) -> Result<LidarDataset, ParseError> {
        let collection = read_feature_collection(&self.filename)?;
        LidarDataset::from_collection(collection).map_err(|source| ParseError::Model {
            path: self.filename.clone(),
            source,
        })
    }
}

/// Reads the tile-level annotation dataset.
pub struct AnnotationParser {
    pub filename: PathBuf,
    pub id_property: String,
}

impl Parser for AnnotationParser {
    type Output = AnnotationDataset;

    fn parse(&self) -> Result<AnnotationDataset, ParseError> {
        let collection = read_feature_collection(&self.filename)?;
        Ok(AnnotationDataset::new(collection, self.id_property.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use tank_core::tank::TankId;

    #[test]
    fn parses_lidar_file() {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        write!(
            file,
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","geometry":{{"type":"Point","coordinates":[-98.0,30.0]}},
                  "properties":{{"X coordinate":-98.0,"Y coordinate":30.0,"Z coordinate":181.25,
                                 "object_class":"external_floating_roof_tank"}}}}]}}"#
        )
        .unwrap();

        let ds = LidarParser {
            filename: file.path().to_path_buf(),
        }
        .parse()
        .unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.points[0].z, 181.25);
    }

    #[test]
    fn lidar_without_coordinates_is_a_model_error() {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        write!(
            file,
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","geometry":null,"properties":{{}}}}]}}"#
        )
        .unwrap();
        let err = LidarParser {
            filename: file.path().to_path_buf(),
        }
        .parse()
        .unwrap_err();
        assert!(matches!(err, ParseError::Model { .. }));
    }

    #[test]
    fn missing_annotation_file_is_io_error() {
        let err = AnnotationParser {
            filename: PathBuf::from("/nonexistent/tile_level_annotations.geojson"),
            id_property: "id".to_string(),
        }
        .parse()
        .unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn parses_annotations() {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        write!(
            file,
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","geometry":null,"properties":{{"id":12}}}}]}}"#
        )
        .unwrap();
        let ds = AnnotationParser {
            filename: file.path().to_path_buf(),
            id_property: "id".to_string(),
        }
        .parse()
        .unwrap();
        assert!(ds.contains(&TankId::new("12")));
    }
}
