//! Raw record normalization.
//!
//! Converts a loosely-typed field report into a [`CanonicalRecord`]. The
//! conversion is total: malformed numbers and dates degrade to `None`.

use crate::models::{CanonicalRecord, RawRecord};
use chrono::NaiveDate;

/// Accepted date layouts, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Values of the groundwater field that mean "encountered".
const TRUTHY: [&str; 3] = ["true", "yes", "1"];

/// Parse a numeric field. Empty, `"None"` and non-numeric text yield `None`.
pub fn parse_float(value: Option<&str>) -> Option<f64> {
    let s = value?.trim();
    if s.is_empty() || s == "None" {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date field using the first matching layout.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let s = value?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn text(raw: &RawRecord, field: &str) -> String {
    raw.get(field).unwrap_or_default().to_string()
}

/// Normalize one raw field report.
pub fn normalize(raw: &RawRecord) -> CanonicalRecord {
    let start_dt = parse_date(raw.get("StartDate"));
    let end_dt = parse_date(raw.get("EndDate")).or(start_dt);

    let duration_days = match (start_dt, end_dt) {
        (Some(start), Some(end)) => Some((end - start).num_days() + 1),
        _ => None,
    };

    let groundwater_flag = raw
        .get("GroundwaterEncountered")
        .map(|v| TRUTHY.contains(&v.to_lowercase().as_str()))
        .unwrap_or(false);

    CanonicalRecord {
        borehole_id: text(raw, "BoreholeID"),
        project: text(raw, "ProjectName"),
        site: text(raw, "SiteName"),
        latitude: parse_float(raw.get("Latitude")),
        longitude: parse_float(raw.get("Longitude")),
        start_date: text(raw, "StartDate"),
        end_date: text(raw, "EndDate"),
        start_dt,
        end_dt,
        duration_days,
        method: text(raw, "DrillingMethod"),
        target_depth: parse_float(raw.get("TargetDepth_m")),
        final_depth: parse_float(raw.get("FinalDepth_m")),
        groundwater_depth: parse_float(raw.get("GroundwaterDepth_m")),
        groundwater_flag,
        soil_description: text(raw, "SoilDescription"),
        uscs: text(raw, "USCS_Class"),
        avg_spt: parse_float(raw.get("Avg_SPT_N60")),
        contractor: text(raw, "Contractor"),
        geologist: text(raw, "LoggingGeologist"),
        remarks: text(raw, "Remarks"),
    }
}

/// Normalize every record and keep the dated ones, oldest first.
///
/// The sort is stable, so records sharing a start date keep source order.
pub fn normalize_dated(records: &[RawRecord]) -> Vec<CanonicalRecord> {
    let mut rows: Vec<CanonicalRecord> = records
        .iter()
        .map(normalize)
        .filter(|r| r.start_dt.is_some())
        .collect();
    rows.sort_by_key(|r| r.start_dt);
    rows
}
