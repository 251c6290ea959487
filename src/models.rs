//! Data models for soil boring analytics.
//!
//! This module contains the record shapes flowing through the pipeline
//! (raw field reports and their canonical form) and the report structures
//! handed back to callers.

use crate::analysis::Tally;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One field report as supplied by the record source.
///
/// Keys follow the source's column vocabulary (`BoreholeID`, `StartDate`, ...).
/// A `None` value models an explicit null; an absent key and a null are
/// treated the same by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: HashMap<String, Option<String>>,
}

impl RawRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly useful when assembling records by hand.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, Some(value.into()));
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        self.fields.insert(field.into(), value);
    }

    /// Returns the field value, or `None` when absent or null.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }

    /// Number of fields present (including nulls).
    #[allow(dead_code)] // Only exercised by tests
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(k, v)| (k.into(), Some(v.into())))
            .collect();
        Self { fields }
    }
}

/// Normalized, typed representation of one field report.
///
/// Every attribute has a safe default, so a record built from garbage input
/// is still valid to aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub borehole_id: String,
    pub project: String,
    pub site: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Start date exactly as supplied.
    pub start_date: String,
    /// End date exactly as supplied.
    pub end_date: String,
    pub start_dt: Option<NaiveDate>,
    /// Falls back to `start_dt` when the end date is missing or unparseable.
    pub end_dt: Option<NaiveDate>,
    /// Inclusive day count between start and end.
    pub duration_days: Option<i64>,
    pub method: String,
    pub target_depth: Option<f64>,
    pub final_depth: Option<f64>,
    pub groundwater_depth: Option<f64>,
    pub groundwater_flag: bool,
    pub soil_description: String,
    pub uscs: String,
    pub avg_spt: Option<f64>,
    pub contractor: String,
    pub geologist: String,
    pub remarks: String,
}

/// Earliest/latest dates covered by a record set, formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl PeriodRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            from: from.map(|d| d.format("%Y-%m-%d").to_string()),
            to: to.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Returns `(from, to)` when both ends are known.
    pub fn bounds(&self) -> Option<(&str, &str)> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => Some((from.as_str(), to.as_str())),
            _ => None,
        }
    }
}

/// Statistical rollup over a set of canonical records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoringStats {
    pub count: usize,
    pub avg_final_depth: Option<f64>,
    /// Mean groundwater depth over records where groundwater was encountered.
    pub avg_groundwater_depth: Option<f64>,
    pub avg_spt: Option<f64>,
    pub total_meterage: f64,
    pub method_breakdown: Tally,
    pub uscs_breakdown: Tally,
    pub projects: Vec<String>,
    pub sites: Vec<String>,
    pub top_contractor: Option<String>,
    pub period_range: PeriodRange,
}

/// Compact projection of a record for the dashboard's recent list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentReport {
    pub borehole_id: String,
    pub project: String,
    pub site: String,
    pub start_date: String,
    pub final_depth_m: Option<f64>,
    pub groundwater_depth_m: Option<f64>,
    pub method: String,
}

impl From<&CanonicalRecord> for RecentReport {
    fn from(r: &CanonicalRecord) -> Self {
        Self {
            borehole_id: r.borehole_id.clone(),
            project: r.project.clone(),
            site: r.site.clone(),
            start_date: r.start_date.clone(),
            final_depth_m: r.final_depth,
            groundwater_depth_m: r.groundwater_depth,
            method: r.method.clone(),
        }
    }
}

/// Snapshot over every dated record.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub total_boreholes: usize,
    pub avg_final_depth_m: Option<f64>,
    pub avg_groundwater_depth_m: Option<f64>,
    pub total_meterage_m: f64,
    pub active_projects: usize,
    pub project_list: Vec<String>,
    pub method_breakdown: Tally,
    pub uscs_breakdown: Tally,
    pub top_contractor: Option<String>,
    pub period_range: PeriodRange,
    pub period_label: Option<String>,
    pub recent_reports: Vec<RecentReport>,
    pub narrative: Option<String>,
}

/// Time-window granularity for summary reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Weekly,
    Monthly,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
        }
    }
}

/// Requested window for a summary report.
///
/// Explicit bounds are expected to be pre-validated by the caller: both
/// weekly dates or neither, both month and year or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodQuery {
    pub period: Period,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PeriodQuery {
    /// Rolling 7-day window.
    pub fn weekly() -> Self {
        Self {
            period: Period::Weekly,
            ..Self::default()
        }
    }

    /// Explicit inclusive weekly window.
    pub fn weekly_between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            period: Period::Weekly,
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    /// Rolling 30-day window.
    pub fn monthly() -> Self {
        Self {
            period: Period::Monthly,
            ..Self::default()
        }
    }

    /// Explicit calendar month.
    pub fn monthly_of(month: u32, year: i32) -> Self {
        Self {
            period: Period::Monthly,
            month: Some(month),
            year: Some(year),
            ..Self::default()
        }
    }

    /// Explicit weekly bounds, if both were supplied.
    pub fn explicit_week(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start_date.zip(self.end_date)
    }

    /// Explicit calendar month, if both month and year were supplied.
    pub fn explicit_month(&self) -> Option<(u32, i32)> {
        match (self.month, self.year) {
            (Some(m), Some(y)) if m > 0 && y > 0 => Some((m, y)),
            _ => None,
        }
    }
}

/// Aggregates carried by a summary report.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub as_of: String,
    pub boreholes: usize,
    pub projects: Vec<String>,
    pub sites: Vec<String>,
    pub avg_final_depth_m: Option<f64>,
    pub avg_groundwater_depth_m: Option<f64>,
    pub avg_spt_n60: Option<f64>,
    pub total_meterage_m: f64,
    pub method_breakdown: Tally,
    pub uscs_breakdown: Tally,
    pub top_contractor: Option<String>,
    pub period_range: PeriodRange,
    pub period_label: Option<String>,
}

/// Snapshot over records inside a requested period.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub period: Period,
    /// Plain-text rendering of the summary.
    pub text: String,
    pub stats: SummaryStats,
    pub highlights: Vec<String>,
    pub narrative: Option<String>,
    pub period_range: PeriodRange,
    pub period_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_get_treats_null_as_absent() {
        let mut raw = RawRecord::new().with("BoreholeID", "BH-01");
        raw.insert("Remarks", None);

        assert_eq!(raw.get("BoreholeID"), Some("BH-01"));
        assert_eq!(raw.get("Remarks"), None);
        assert_eq!(raw.get("SiteName"), None);
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn test_raw_record_from_iter() {
        let raw: RawRecord = [("ProjectName", "North Bridge"), ("SiteName", "Pier 3")]
            .into_iter()
            .collect();
        assert_eq!(raw.get("ProjectName"), Some("North Bridge"));
        assert_eq!(raw.get("SiteName"), Some("Pier 3"));
    }

    #[test]
    fn test_period_display() {
        assert_eq!(Period::Weekly.to_string(), "weekly");
        assert_eq!(Period::Monthly.to_string(), "monthly");
        assert_eq!(serde_json::to_string(&Period::Monthly).unwrap(), "\"monthly\"");
    }

    #[test]
    fn test_period_range_bounds() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let range = PeriodRange::new(Some(d), Some(d));
        assert_eq!(range.bounds(), Some(("2024-03-01", "2024-03-01")));
        assert_eq!(PeriodRange::default().bounds(), None);
    }

    #[test]
    fn test_period_query_explicit_parts() {
        let q = PeriodQuery::monthly_of(3, 2024);
        assert_eq!(q.explicit_month(), Some((3, 2024)));
        assert_eq!(q.explicit_week(), None);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let q = PeriodQuery::weekly_between(start, end);
        assert_eq!(q.explicit_week(), Some((start, end)));
        assert_eq!(PeriodQuery::monthly().explicit_month(), None);
    }
}
