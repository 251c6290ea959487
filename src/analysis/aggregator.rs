//! Record aggregation and statistics.
//!
//! This module computes the rollups shared by the dashboard and summary
//! reports: counts, averages, breakdowns and date coverage.

use crate::analysis::Tally;
use crate::models::{BoringStats, CanonicalRecord, PeriodRange};
use std::collections::BTreeSet;

/// Round to a fixed number of decimal places, exact halves to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Mean of the present values, rounded to 2 places. `None` when nothing is present.
pub fn average<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }
    Some(round_to(present.iter().sum::<f64>() / present.len() as f64, 2))
}

/// Sum of final depths with missing values counted as zero, rounded to 1 place.
pub fn total_meterage(records: &[CanonicalRecord]) -> f64 {
    // f64 `Sum` starts from -0.0; an empty total must stay +0.0
    let total = records
        .iter()
        .filter_map(|r| r.final_depth)
        .fold(0.0, |acc, d| acc + d);
    round_to(total, 1)
}

/// Sorted, deduplicated non-empty values.
fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Frequency count of non-empty values.
fn breakdown<'a, I>(values: I) -> Tally
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().filter(|v| !v.is_empty()).collect()
}

/// Earliest and latest start dates among dated records.
pub fn period_range(records: &[CanonicalRecord]) -> PeriodRange {
    let dates = records.iter().filter_map(|r| r.start_dt);
    let from = dates.clone().min();
    let to = dates.max();
    PeriodRange::new(from, to)
}

/// Compute the full statistical rollup for a record set.
pub fn aggregate(records: &[CanonicalRecord]) -> BoringStats {
    let contractors = breakdown(records.iter().map(|r| r.contractor.as_str()));

    BoringStats {
        count: records.len(),
        avg_final_depth: average(records.iter().map(|r| r.final_depth)),
        avg_groundwater_depth: average(
            records
                .iter()
                .filter(|r| r.groundwater_flag)
                .map(|r| r.groundwater_depth),
        ),
        avg_spt: average(records.iter().map(|r| r.avg_spt)),
        total_meterage: total_meterage(records),
        method_breakdown: breakdown(records.iter().map(|r| r.method.as_str())),
        uscs_breakdown: breakdown(records.iter().map(|r| r.uscs.as_str())),
        projects: distinct(records.iter().map(|r| r.project.as_str())),
        sites: distinct(records.iter().map(|r| r.site.as_str())),
        top_contractor: contractors.top().map(String::from),
        period_range: period_range(records),
    }
}
