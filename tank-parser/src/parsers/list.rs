//! List files: a JSON array (of strings or integers) or one entry per line.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tank_core::tank::TankId;

use crate::error::ParseError;

pub fn read_list(path: &Path) -> Result<Vec<String>, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_list(&text).map_err(|message| ParseError::List {
        path: path.to_path_buf(),
        message,
    })
}

pub fn read_tank_ids(path: &Path) -> Result<Vec<TankId>, ParseError> {
    Ok(read_list(path)?.into_iter().map(TankId::new).collect())
}

pub fn read_path_list(path: &Path) -> Result<Vec<PathBuf>, ParseError> {
    Ok(read_list(path)?.into_iter().map(PathBuf::from).collect())
}

fn parse_list(text: &str) -> Result<Vec<String>, String> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('[') {
        return Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect());
    }

    let values: Vec<Value> = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::String(s) => Ok(s.trim().to_string()),
            Value::Number(_) => TankId::from_json(v)
                .map(|id| id.to_string())
                .ok_or_else(|| format!("entry #{i} is not an integer: {v}")),
            other => Err(format!("entry #{i} is not a string or integer: {other}")),
        })
        .collect()
}
