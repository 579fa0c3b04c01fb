use std::{
    fs,
    io::{self, BufWriter, Write},
    path::Path,
};

use tank_core::geojson::FeatureCollection;
use tempfile::NamedTempFile;

use crate::error::ExportError;

/// Writes a temporary file next to `path`, then renames it over `path`.
/// Readers see either the old file or the complete new one. An existing
/// file keeps its permissions.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), ExportError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(ExportError::io(path))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush().map_err(ExportError::io(path))?;
    }
    match fs::metadata(path) {
        Ok(existing) => tmp
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(ExportError::io(path))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(ExportError::io(path)(e)),
    }
    tmp.as_file().sync_all().map_err(ExportError::io(path))?;
    tmp.persist(path)
        .map_err(|e| ExportError::io(path)(e.error))?;
    Ok(())
}

pub fn write_feature_collection(
    path: &Path,
    collection: &FeatureCollection,
) -> Result<(), ExportError> {
    write_atomically(path, |writer| {
        serde_json::to_writer(writer, collection).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })
    })?;
    log::debug!(
        "wrote {} features to {}",
        collection.features.len(),
        path.display()
    );
    Ok(())
}
