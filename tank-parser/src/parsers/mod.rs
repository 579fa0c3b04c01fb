use std::path::Path;

use crate::error::ParseError;

pub mod geojson;
pub mod geotiff;
pub mod imagery;
pub mod list;

pub trait Parser {
    type Output;

    fn parse(&self) -> Result<Self::Output, ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    GeoJson,
    Json,
    Tif,
    Txt,
    Jpg,
    Png,
}

impl Extension {
    pub fn of(path: &Path) -> Result<Self, ParseError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        get_extension(ext)
    }
}

pub fn get_extension(extension: &str) -> Result<Extension, ParseError> {
    match extension.to_ascii_lowercase().as_str() {
        "geojson" => Ok(Extension::GeoJson),
        "json" => Ok(Extension::Json),
        "tif" | "tiff" => Ok(Extension::Tif),
        "txt" | "lst" | "" => Ok(Extension::Txt),
        "jpg" | "jpeg" => Ok(Extension::Jpg),
        "png" => Ok(Extension::Png),
        other => Err(ParseError::UnsupportedExtension(other.to_string())),
    }
}
