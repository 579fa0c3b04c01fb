use std::path::PathBuf;

use tank_core::{tank::TankId, ModelError};

use crate::source::DataKind;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{}: invalid TIFF: {source}", path.display())]
    Tiff {
        path: PathBuf,
        source: tiff::TiffError,
    },
    #[error("{}: {message}", path.display())]
    GeoTiff { path: PathBuf, message: String },
    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("{}: {source}", path.display())]
    Model { path: PathBuf, source: ModelError },
    #[error("{}: {message}", path.display())]
    List { path: PathBuf, message: String },
    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no {kind} file for tank id {tank_id}")]
    Unmatched { tank_id: TankId, kind: DataKind },
    #[error("tank id {tank_id} matches several {kind} files: {paths:?}")]
    Ambiguous {
        tank_id: TankId,
        kind: DataKind,
        paths: Vec<PathBuf>,
    },
    #[error("no image tile named {tile_name}")]
    UnmatchedTile { tile_name: String },
    #[error("image tile {tile_name} matches several files: {paths:?}")]
    AmbiguousTile {
        tile_name: String,
        paths: Vec<PathBuf>,
    },
    #[error("invalid glob pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}
