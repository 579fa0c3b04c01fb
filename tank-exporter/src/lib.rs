pub mod error;
pub mod geojson;
pub mod list;
pub mod plot;
pub mod report;

pub use error::ExportError;
