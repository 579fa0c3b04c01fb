use std::path::Path;

use tank_core::tank::TankId;

use crate::{error::ExportError, geojson::write_atomically};

/// Writes `ids` as a JSON array of strings, in the order given.
pub fn write_tank_ids(path: &Path, ids: &[TankId]) -> Result<(), ExportError> {
    write_atomically(path, |writer| {
        serde_json::to_writer(writer, ids).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })
    })
}
