//! Record source.
//!
//! Loads raw field reports from a CSV export or a JSON array. Loading is
//! schema-tolerant: unknown columns are kept but ignored downstream, and
//! missing columns are simply absent.

use crate::models::RawRecord;
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column vocabulary of a soil boring field report.
pub const FIELDS: [&str; 22] = [
    "BoreholeID",
    "ProjectName",
    "SiteName",
    "Latitude",
    "Longitude",
    "GroundElevation_mRL",
    "StartDate",
    "EndDate",
    "DrillingMethod",
    "BoreholeDiameter_mm",
    "TargetDepth_m",
    "FinalDepth_m",
    "CasingInstalled_mm",
    "GroundwaterDepth_m",
    "GroundwaterEncountered",
    "SoilDescription",
    "USCS_Class",
    "Avg_SPT_N60",
    "Contractor",
    "LoggingGeologist",
    "Remarks",
    "SubmittedBy",
];

/// Load every record from `path`.
///
/// A missing file is an empty source, not an error.
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        warn!("Record source {} does not exist, using no records", path.display());
        return Ok(Vec::new());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let records = match extension.as_str() {
        "json" => load_json(path)?,
        "csv" | "" => load_csv(path)?,
        other => bail!("Unsupported record source format: .{}", other),
    };

    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open record source: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let missing: Vec<&str> = FIELDS
        .iter()
        .copied()
        .filter(|field| !headers.iter().any(|h| h == *field))
        .collect();
    if !missing.is_empty() {
        debug!("Record source lacks columns: {}", missing.join(", "));
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| {
            format!("Failed to read row {} of {}", index + 1, path.display())
        })?;
        // short rows leave their trailing columns absent
        records.push(headers.iter().zip(row.iter()).collect());
    }

    Ok(records)
}

fn load_json(path: &Path) -> Result<Vec<RawRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record source: {}", path.display()))?;
    records_from_json(&content)
        .with_context(|| format!("Failed to parse record source: {}", path.display()))
}

/// Parse a JSON array of objects into raw records.
///
/// Strings are kept as-is, `null` becomes an explicit null, numbers and
/// booleans are kept in their textual form and nested values are dropped.
pub fn records_from_json(content: &str) -> Result<Vec<RawRecord>> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        bail!("expected a JSON array of records");
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(map) = item else {
            debug!("Skipping non-object record entry");
            continue;
        };
        let mut record = RawRecord::new();
        for (field, value) in map {
            match value {
                Value::String(s) => record.insert(field, Some(s)),
                Value::Null => record.insert(field, None),
                Value::Number(n) => record.insert(field, Some(n.to_string())),
                Value::Bool(b) => record.insert(field, Some(b.to_string())),
                Value::Array(_) | Value::Object(_) => {}
            }
        }
        records.push(record);
    }

    Ok(records)
}
