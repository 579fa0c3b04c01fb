use std::path::PathBuf;

use coordinate_transformer::ProjectionError;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write report {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("failed to encode plot {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to load the plot font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl ExportError {
    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
