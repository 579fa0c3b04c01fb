pub mod error;
pub mod parsers;
pub mod source;

pub use error::{ParseError, SourceError};
