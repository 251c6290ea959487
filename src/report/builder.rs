//! Report orchestration.
//!
//! Runs normalization, filtering and aggregation to produce the dashboard
//! and periodic summary reports, then asks for an optional narrative.

use crate::analysis::{aggregate, filter_period_at, normalize_dated};
use crate::llm::NarrativeGenerator;
use crate::models::{
    CanonicalRecord, DashboardReport, Period, PeriodQuery, PeriodRange, RawRecord, RecentReport,
    SummaryReport, SummaryStats,
};
use crate::report::generator::{highlight_line, render_summary_text};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, warn};

const DASHBOARD_TITLE: &str = "Soil boring operations dashboard";

const DASHBOARD_INSTRUCTION: &str = "Review the soil boring KPIs and write a short executive \
briefing (<=90 words). Highlight borehole volume, depth progression, groundwater observations, \
and any notable contractors or methods.";

const SUMMARY_INSTRUCTION: &str = "You are a geotechnical engineer summarizing soil boring \
progress. Using the provided statistics, craft a concise executive summary (<=120 words) \
covering drilling volume, groundwater conditions, soil behavior, and any risk signals.";

/// Size limits for the list sections of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Entries in the dashboard's recent list.
    pub recent_limit: usize,
    /// Highlight lines in a summary.
    pub highlight_limit: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            highlight_limit: 3,
        }
    }
}

/// Dashboard metrics without a narrative.
pub fn compute_dashboard(records: &[RawRecord], options: &ReportOptions) -> DashboardReport {
    let rows = normalize_dated(records);
    let stats = aggregate(&rows);
    debug!("Dashboard over {} dated records", rows.len());

    let period_label = stats
        .period_range
        .bounds()
        .map(|(from, to)| format!("{} to {}", from, to));

    let mut recent: Vec<&CanonicalRecord> = rows.iter().collect();
    // stable, so equal dates keep their relative order
    recent.sort_by(|a, b| b.start_dt.cmp(&a.start_dt));
    let recent_reports = recent
        .into_iter()
        .take(options.recent_limit)
        .map(RecentReport::from)
        .collect();

    DashboardReport {
        total_boreholes: stats.count,
        avg_final_depth_m: stats.avg_final_depth,
        avg_groundwater_depth_m: stats.avg_groundwater_depth,
        total_meterage_m: stats.total_meterage,
        active_projects: stats.projects.len(),
        project_list: stats.projects,
        method_breakdown: stats.method_breakdown,
        uscs_breakdown: stats.uscs_breakdown,
        top_contractor: stats.top_contractor,
        period_range: stats.period_range,
        period_label,
        recent_reports,
        narrative: None,
    }
}

/// Dashboard report with an optional narrative.
pub async fn build_dashboard_report(
    records: &[RawRecord],
    options: &ReportOptions,
    narrator: &NarrativeGenerator,
) -> DashboardReport {
    let mut report = compute_dashboard(records, options);

    if report.total_boreholes > 0 {
        let payload = match serde_json::to_value(&report) {
            Ok(Value::Object(mut map)) => {
                map.remove("narrative");
                Value::Object(map)
            }
            Ok(other) => other,
            Err(e) => {
                warn!("Failed to serialize dashboard metrics: {}", e);
                Value::Null
            }
        };
        report.narrative = narrator
            .generate_narrative(DASHBOARD_TITLE, DASHBOARD_INSTRUCTION, &payload)
            .await;
    }

    report
}

fn month_label(month: u32, year: i32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.format("%B %Y").to_string())
}

/// Human-readable name of the covered period.
fn period_label(query: &PeriodQuery, range: &PeriodRange) -> Option<String> {
    match query.period {
        Period::Weekly => range.bounds().map(|(from, to)| format!("{} to {}", from, to)),
        Period::Monthly => match query.explicit_month() {
            Some((month, year)) => month_label(month, year),
            None => range.to.as_ref().map(|to| format!("Up to {}", to)),
        },
    }
}

/// Summary report without a narrative, evaluated at `now`.
pub fn compute_summary_at(
    records: &[RawRecord],
    query: &PeriodQuery,
    options: &ReportOptions,
    now: NaiveDateTime,
) -> SummaryReport {
    let all_rows = normalize_dated(records);
    let rows = filter_period_at(&all_rows, query, now);
    debug!(
        "Summary ({}) keeps {} of {} dated records",
        query.period,
        rows.len(),
        all_rows.len()
    );

    let stats = aggregate(&rows);

    let period_range = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => PeriodRange::new(first.start_dt, last.start_dt),
        _ => PeriodRange::new(query.start_date, query.end_date),
    };
    let label = period_label(query, &period_range);

    let skip = rows.len().saturating_sub(options.highlight_limit);
    let highlights: Vec<String> = rows[skip..].iter().map(highlight_line).collect();

    let text = render_summary_text(query.period, label.as_deref(), &stats, &highlights);

    SummaryReport {
        period: query.period,
        text,
        stats: SummaryStats {
            as_of: now.format("%Y-%m-%d %H:%M UTC").to_string(),
            boreholes: stats.count,
            projects: stats.projects,
            sites: stats.sites,
            avg_final_depth_m: stats.avg_final_depth,
            avg_groundwater_depth_m: stats.avg_groundwater_depth,
            avg_spt_n60: stats.avg_spt,
            total_meterage_m: stats.total_meterage,
            method_breakdown: stats.method_breakdown,
            uscs_breakdown: stats.uscs_breakdown,
            top_contractor: stats.top_contractor,
            period_range: period_range.clone(),
            period_label: label.clone(),
        },
        highlights,
        narrative: None,
        period_range,
        period_label: label,
    }
}

/// Summary report with an optional narrative, evaluated now.
pub async fn build_summary_report(
    records: &[RawRecord],
    query: &PeriodQuery,
    options: &ReportOptions,
    narrator: &NarrativeGenerator,
) -> SummaryReport {
    build_summary_report_at(records, query, options, narrator, Utc::now().naive_utc()).await
}

/// Summary report with an optional narrative, evaluated at `now`.
pub async fn build_summary_report_at(
    records: &[RawRecord],
    query: &PeriodQuery,
    options: &ReportOptions,
    narrator: &NarrativeGenerator,
    now: NaiveDateTime,
) -> SummaryReport {
    let mut report = compute_summary_at(records, query, options, now);

    if report.stats.boreholes > 0 {
        let payload = json!({
            "period": report.period,
            "stats": report.stats,
            "highlights": report.highlights,
        });
        let title = format!("Soil boring {} performance", report.period);
        report.narrative = narrator
            .generate_narrative(&title, SUMMARY_INSTRUCTION, &payload)
            .await;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::FakeGenerator;
    use std::sync::Arc;
    use std::time::Duration;

    fn boring(id: &str, project: &str, start: &str, depth: &str) -> RawRecord {
        RawRecord::new()
            .with("BoreholeID", id)
            .with("ProjectName", project)
            .with("SiteName", "Main Yard")
            .with("StartDate", start)
            .with("FinalDepth_m", depth)
            .with("DrillingMethod", "Rotary")
            .with("Contractor", "Deepcore")
    }

    fn three_records() -> Vec<RawRecord> {
        vec![
            boring("BH-1", "Harbour Link", "2024-01-10", "5"),
            boring("BH-2", "Harbour Link", "2024-02-15", "10"),
            boring("BH-3", "North Bridge", "2024-02-20", "15"),
        ]
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_dashboard_end_to_end() {
        let report = compute_dashboard(&three_records(), &ReportOptions::default());

        assert_eq!(report.total_boreholes, 3);
        assert_eq!(report.avg_final_depth_m, Some(10.0));
        assert_eq!(report.total_meterage_m, 30.0);
        assert_eq!(report.active_projects, 2);
        assert_eq!(report.project_list, vec!["Harbour Link", "North Bridge"]);
        assert_eq!(report.top_contractor.as_deref(), Some("Deepcore"));
        assert_eq!(report.period_label.as_deref(), Some("2024-01-10 to 2024-02-20"));

        let ids: Vec<&str> = report
            .recent_reports
            .iter()
            .map(|r| r.borehole_id.as_str())
            .collect();
        assert_eq!(ids, vec!["BH-3", "BH-2", "BH-1"]);
        assert_eq!(report.recent_reports[0].final_depth_m, Some(15.0));
    }

    #[test]
    fn test_dashboard_excludes_undated_and_limits_recent() {
        let mut records = three_records();
        records.push(boring("BH-X", "Ghost", "unknown", "99"));
        for day in 1..=4 {
            records.push(boring(&format!("BH-M{day}"), "Harbour Link", "2024-03-01", "1"));
        }

        let report = compute_dashboard(&records, &ReportOptions::default());

        assert_eq!(report.total_boreholes, 7);
        assert!(!report.project_list.contains(&"Ghost".to_string()));
        let ids: Vec<&str> = report
            .recent_reports
            .iter()
            .map(|r| r.borehole_id.as_str())
            .collect();
        assert_eq!(ids, vec!["BH-M1", "BH-M2", "BH-M3", "BH-M4", "BH-3"]);
    }

    #[test]
    fn test_dashboard_serializes_narrative_null() {
        let report = compute_dashboard(&[], &ReportOptions::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_boreholes"], 0);
        assert!(json["narrative"].is_null());
        assert!(json["avg_final_depth_m"].is_null());
        assert!(json["period_range"]["from"].is_null());
        assert_eq!(json["recent_reports"], json!([]));
    }

    #[test]
    fn test_weekly_summary_with_explicit_bounds() {
        let query = PeriodQuery::weekly_between(
            NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 20).unwrap(),
        );
        let report =
            compute_summary_at(&three_records(), &query, &ReportOptions::default(), at(2030, 1, 1));

        assert_eq!(report.stats.boreholes, 2);
        assert_eq!(report.period_label.as_deref(), Some("2024-02-15 to 2024-02-20"));
        assert_eq!(report.period_range.from.as_deref(), Some("2024-02-15"));
        assert_eq!(report.stats.as_of, "2030-01-01 09:30 UTC");
        assert_eq!(report.highlights.len(), 2);
        assert!(report.highlights[1].starts_with("2024-02-20 | BH-3 at North Bridge"));
        assert!(report
            .text
            .starts_with("Soil boring weekly summary (2024-02-15 to 2024-02-20)"));
    }

    #[test]
    fn test_weekly_summary_empty_falls_back_to_requested_bounds() {
        let query = PeriodQuery::weekly_between(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
        );
        let report =
            compute_summary_at(&three_records(), &query, &ReportOptions::default(), at(2030, 1, 1));

        assert_eq!(report.stats.boreholes, 0);
        assert_eq!(report.period_label.as_deref(), Some("2025-01-01 to 2025-01-07"));
        assert!(report.highlights.is_empty());
    }

    #[test]
    fn test_monthly_summary_with_explicit_month() {
        let report = compute_summary_at(
            &three_records(),
            &PeriodQuery::monthly_of(2, 2024),
            &ReportOptions::default(),
            at(2030, 1, 1),
        );
        assert_eq!(report.stats.boreholes, 2);
        assert_eq!(report.period_label.as_deref(), Some("February 2024"));
        assert_eq!(report.stats.avg_final_depth_m, Some(12.5));
    }

    #[test]
    fn test_monthly_summary_without_matches() {
        let report = compute_summary_at(
            &three_records(),
            &PeriodQuery::monthly_of(3, 2023),
            &ReportOptions::default(),
            at(2030, 1, 1),
        );
        assert_eq!(report.stats.boreholes, 0);
        assert_eq!(report.period_range, PeriodRange::default());
        assert_eq!(report.period_label.as_deref(), Some("March 2023"));
        assert!(report.stats.total_meterage_m.is_sign_positive());
        assert!(report.text.contains("- Total meterage drilled: 0.0 m"));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"total_meterage_m\":0.0"));
        assert!(!json.contains("-0.0"));
    }

    #[test]
    fn test_rolling_monthly_summary_labels() {
        let records = three_records();
        let options = ReportOptions::default();

        let report = compute_summary_at(&records, &PeriodQuery::monthly(), &options, at(2024, 3, 1));
        assert_eq!(report.stats.boreholes, 2);
        assert_eq!(report.period_label.as_deref(), Some("Up to 2024-02-20"));

        let report = compute_summary_at(&records, &PeriodQuery::monthly(), &options, at(2030, 1, 1));
        assert_eq!(report.stats.boreholes, 0);
        assert_eq!(report.period_range, PeriodRange::default());
        assert_eq!(report.period_label, None);
        assert!(report.text.starts_with("Soil boring monthly summary (latest interval)"));
    }

    #[test]
    fn test_highlights_are_latest_records() {
        let mut records = three_records();
        records.push(boring("BH-4", "North Bridge", "2024-02-25", "8"));
        let report = compute_summary_at(
            &records,
            &PeriodQuery::monthly_of(2, 2024),
            &ReportOptions {
                recent_limit: 5,
                highlight_limit: 2,
            },
            at(2030, 1, 1),
        );
        assert_eq!(report.highlights.len(), 2);
        assert!(report.highlights[0].contains("BH-3"));
        assert!(report.highlights[1].contains("BH-4"));
    }

    #[tokio::test]
    async fn test_dashboard_narrative_attached() {
        let fake = Arc::new(FakeGenerator::replying("Three boreholes, steady progress."));
        let narrator = NarrativeGenerator::new(fake.clone(), Duration::from_secs(90));

        let report =
            build_dashboard_report(&three_records(), &ReportOptions::default(), &narrator).await;

        assert_eq!(report.narrative.as_deref(), Some("Three boreholes, steady progress."));
        let context = fake.last_context().unwrap();
        assert!(context.contains(DASHBOARD_TITLE));
        assert!(context.contains("\"total_boreholes\": 3"));
        assert!(!context.contains("\"narrative\""));
    }

    #[tokio::test]
    async fn test_empty_reports_skip_narrative() {
        let fake = Arc::new(FakeGenerator::replying("unused"));
        let narrator = NarrativeGenerator::new(fake.clone(), Duration::from_secs(90));

        let dashboard = build_dashboard_report(&[], &ReportOptions::default(), &narrator).await;
        let summary = build_summary_report_at(
            &three_records(),
            &PeriodQuery::monthly_of(6, 2020),
            &ReportOptions::default(),
            &narrator,
            at(2030, 1, 1),
        )
        .await;

        assert_eq!(dashboard.narrative, None);
        assert_eq!(summary.narrative, None);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_summary_narrative_failure_keeps_report() {
        let fake = Arc::new(FakeGenerator::failing());
        let narrator = NarrativeGenerator::new(fake.clone(), Duration::from_secs(90));

        let report = build_summary_report_at(
            &three_records(),
            &PeriodQuery::monthly_of(2, 2024),
            &ReportOptions::default(),
            &narrator,
            at(2030, 1, 1),
        )
        .await;

        assert_eq!(report.narrative, None);
        assert_eq!(report.stats.boreholes, 2);
        assert_eq!(fake.calls(), 1);
        let context = fake.last_context().unwrap();
        assert!(context.contains("Soil boring monthly performance"));
        assert!(context.contains("\"highlights\""));
    }
}
