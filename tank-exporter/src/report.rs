//! Per-tank height report (CSV).

use std::path::Path;

use height_estimator::{statistic::round2, HeightStatistic, HeightSummary};
use tank_core::tank::TankId;

use crate::{error::ExportError, geojson::write_atomically};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub tank_id: TankId,
    pub object_class: Option<String>,
    /// `None` when the tank failed before its statistics were computed.
    pub summary: Option<HeightSummary>,
    /// Error message of a failed tank.
    pub error: Option<String>,
}

impl ReportRow {
    pub fn ok(tank_id: TankId, object_class: Option<String>, summary: HeightSummary) -> Self {
        Self {
            tank_id,
            object_class,
            summary: Some(summary),
            error: None,
        }
    }

    pub fn failed(tank_id: TankId, error: impl ToString) -> Self {
        Self {
            tank_id,
            object_class: None,
            summary: None,
            error: Some(error.to_string()),
        }
    }

    fn record(&self) -> Vec<String> {
        let mut record = vec![
            self.tank_id.to_string(),
            self.object_class.clone().unwrap_or_default(),
        ];
        match &self.summary {
            Some(summary) => {
                record.push(summary.points.to_string());
                record.push(summary.valid_points.to_string());
                record.extend(HeightStatistic::ALL.iter().map(|&stat| {
                    summary
                        .get(stat)
                        .map(|v| format!("{:.2}", round2(v)))
                        .unwrap_or_default()
                }));
            }
            None => {
                let empty = 2 + HeightStatistic::ALL.len();
                record.extend(std::iter::repeat(String::new()).take(empty));
            }
        }
        record.push(self.error.clone().unwrap_or_else(|| "ok".to_string()));
        record
    }
}

pub fn header() -> Vec<&'static str> {
    let mut header = vec!["tank_id", "object_class", "points", "valid_points"];
    header.extend(HeightStatistic::ALL.iter().map(|s| s.name()));
    header.push("status");
    header
}

/// Writes one row per tank, in the order given.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    write_atomically(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(header()).map_err(csv_err)?;
        for row in rows {
            writer.write_record(row.record()).map_err(csv_err)?;
        }
        writer.flush().map_err(ExportError::io(path))
    })?;
    log::info!("wrote height report for {} tanks to {}", rows.len(), path.display());
    Ok(())
}
