//! Report rendering.
//!
//! Plain-text summary bodies, Markdown documents for both report shapes,
//! and JSON serialization.

use crate::analysis::{display_float, Tally};
use crate::llm::QaAnswer;
use crate::models::{BoringStats, CanonicalRecord, DashboardReport, Period, SummaryReport};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

/// Maximum characters of soil description quoted in a highlight.
const HIGHLIGHT_DESCRIPTION_CHARS: usize = 120;

/// Breakdown entries shown in text and Markdown output.
const TOP_BREAKDOWN: usize = 3;

fn or_dash(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", display_float(v), unit),
        None => "-".to_string(),
    }
}

fn list_or_dash(values: &[String]) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}

fn dominant(tally: &Tally) -> String {
    let entries: Vec<String> = tally
        .most_common(TOP_BREAKDOWN)
        .into_iter()
        .map(|(value, count)| format!("{} ({})", value, count))
        .collect();
    if entries.is_empty() {
        "-".to_string()
    } else {
        entries.join(", ")
    }
}

/// One-line description of a record for the highlights section.
pub fn highlight_line(r: &CanonicalRecord) -> String {
    let depth = r.final_depth.map_or_else(|| "-".to_string(), display_float);
    let mut line = format!(
        "{} | {} at {} ({}): depth {} m",
        r.start_date, r.borehole_id, r.project, r.site, depth
    );
    if !r.soil_description.is_empty() {
        let desc: String = r
            .soil_description
            .chars()
            .take(HIGHLIGHT_DESCRIPTION_CHARS)
            .collect();
        line.push_str(" – ");
        line.push_str(&desc);
    }
    line
}

/// Plain-text body of a periodic summary.
pub fn render_summary_text(
    period: Period,
    label: Option<&str>,
    stats: &BoringStats,
    highlights: &[String],
) -> String {
    let mut lines = vec![
        format!(
            "Soil boring {} summary ({})",
            period,
            label.unwrap_or("latest interval")
        ),
        format!("- Boreholes executed: {}", stats.count),
        format!("- Active projects: {}", list_or_dash(&stats.projects)),
        format!("- Sites logged: {}", list_or_dash(&stats.sites)),
        format!(
            "- Total meterage drilled: {} m",
            display_float(stats.total_meterage)
        ),
        format!("- Average final depth: {}", or_dash(stats.avg_final_depth, " m")),
        format!(
            "- Average groundwater depth: {}",
            or_dash(stats.avg_groundwater_depth, " m")
        ),
        format!("- Average SPT N60: {}", or_dash(stats.avg_spt, "")),
        format!("- Dominant methods: {}", dominant(&stats.method_breakdown)),
        format!("- Dominant USCS classes: {}", dominant(&stats.uscs_breakdown)),
        String::new(),
        "Highlights:".to_string(),
    ];

    lines.extend(highlights.iter().map(|h| format!("- {}", h)));
    lines.join("\n")
}

fn breakdown_table(section: &mut String, heading: &str, column: &str, tally: &Tally) {
    if tally.is_empty() {
        return;
    }
    section.push_str(&format!("### {}\n\n", heading));
    section.push_str(&format!("| {} | Boreholes |\n", column));
    section.push_str("|:---|:---:|\n");
    for (value, count) in tally.most_common(tally.len()) {
        section.push_str(&format!("| {} | {} |\n", value, count));
    }
    section.push('\n');
}

fn narrative_section(narrative: Option<&str>) -> String {
    match narrative {
        Some(text) if !text.trim().is_empty() => format!("## Executive Briefing\n\n{}\n\n", text.trim()),
        _ => String::new(),
    }
}

/// Markdown rendering of the dashboard.
pub fn generate_markdown_dashboard(report: &DashboardReport) -> String {
    let mut output = String::new();

    output.push_str("# Soil Boring Dashboard\n\n");
    if let Some(label) = &report.period_label {
        output.push_str(&format!("*Coverage: {}*\n\n", label));
    }

    output.push_str(&narrative_section(report.narrative.as_deref()));

    output.push_str("## Key Figures\n\n");
    output.push_str(&format!("- **Boreholes:** {}\n", report.total_boreholes));
    output.push_str(&format!(
        "- **Total meterage:** {} m\n",
        display_float(report.total_meterage_m)
    ));
    output.push_str(&format!(
        "- **Average final depth:** {}\n",
        or_dash(report.avg_final_depth_m, " m")
    ));
    output.push_str(&format!(
        "- **Average groundwater depth:** {}\n",
        or_dash(report.avg_groundwater_depth_m, " m")
    ));
    output.push_str(&format!(
        "- **Active projects:** {} ({})\n",
        report.active_projects,
        list_or_dash(&report.project_list)
    ));
    output.push_str(&format!(
        "- **Top contractor:** {}\n\n",
        report.top_contractor.as_deref().unwrap_or("-")
    ));

    breakdown_table(&mut output, "Drilling Methods", "Method", &report.method_breakdown);
    breakdown_table(&mut output, "USCS Classes", "Class", &report.uscs_breakdown);

    output.push_str("## Recent Reports\n\n");
    if report.recent_reports.is_empty() {
        output.push_str("No dated field reports yet.\n");
        return output;
    }
    output.push_str("| Borehole | Project | Site | Start | Final depth (m) | Groundwater (m) | Method |\n");
    output.push_str("|:---|:---|:---|:---:|:---:|:---:|:---|\n");
    for r in &report.recent_reports {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            r.borehole_id,
            r.project,
            r.site,
            r.start_date,
            or_dash(r.final_depth_m, ""),
            or_dash(r.groundwater_depth_m, ""),
            r.method
        ));
    }

    output
}

/// Markdown rendering of a periodic summary.
pub fn generate_markdown_summary(report: &SummaryReport) -> String {
    let mut output = String::new();

    let title = match report.period {
        Period::Weekly => "Weekly",
        Period::Monthly => "Monthly",
    };
    output.push_str(&format!("# {} Soil Boring Summary\n\n", title));
    output.push_str(&format!(
        "*Period: {} | As of: {}*\n\n",
        report.period_label.as_deref().unwrap_or("latest interval"),
        report.stats.as_of
    ));

    output.push_str(&narrative_section(report.narrative.as_deref()));

    output.push_str("## Report\n\n```text\n");
    output.push_str(&report.text);
    output.push_str("\n```\n");

    output
}

/// Markdown rendering of an answer and the rows it was grounded on.
pub fn generate_markdown_answer(question: &str, answer: &QaAnswer) -> String {
    let mut output = format!("## {}\n\n{}\n", question.trim(), answer.answer.trim());
    if !answer.context.is_empty() {
        output.push_str("\n<details>\n<summary>Data snapshot</summary>\n\n```text\n");
        output.push_str(&answer.context);
        output.push_str("\n```\n\n</details>\n");
    }
    output
}

/// Serialize any report to pretty JSON.
pub fn generate_json_report<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PeriodRange, RecentReport};

    fn create_test_stats() -> BoringStats {
        BoringStats {
            count: 2,
            avg_final_depth: Some(12.5),
            avg_groundwater_depth: None,
            avg_spt: Some(14.0),
            total_meterage: 25.0,
            method_breakdown: ["Rotary", "Auger", "Rotary"].into_iter().collect(),
            uscs_breakdown: Tally::new(),
            projects: vec!["Harbour Link".to_string()],
            sites: vec![],
            top_contractor: Some("Deepcore".to_string()),
            period_range: PeriodRange::default(),
        }
    }

    #[test]
    fn test_highlight_line() {
        let record = CanonicalRecord {
            borehole_id: "BH-2".to_string(),
            project: "Harbour Link".to_string(),
            site: "Pier 3".to_string(),
            start_date: "2024-02-15".to_string(),
            final_depth: Some(10.0),
            soil_description: "x".repeat(200),
            ..CanonicalRecord::default()
        };
        let line = highlight_line(&record);
        assert!(line.starts_with("2024-02-15 | BH-2 at Harbour Link (Pier 3): depth 10.0 m – "));
        assert_eq!(line.matches('x').count(), 120);

        let bare = CanonicalRecord {
            start_date: "2024-02-16".to_string(),
            ..CanonicalRecord::default()
        };
        assert_eq!(highlight_line(&bare), "2024-02-16 |  at  (): depth - m");
    }

    #[test]
    fn test_render_summary_text() {
        let text = render_summary_text(
            Period::Weekly,
            Some("2024-02-15 to 2024-02-20"),
            &create_test_stats(),
            &["2024-02-20 | BH-3 at Harbour Link (Yard): depth 15.0 m".to_string()],
        );
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Soil boring weekly summary (2024-02-15 to 2024-02-20)");
        assert_eq!(lines[1], "- Boreholes executed: 2");
        assert_eq!(lines[2], "- Active projects: Harbour Link");
        assert_eq!(lines[3], "- Sites logged: -");
        assert_eq!(lines[4], "- Total meterage drilled: 25.0 m");
        assert_eq!(lines[5], "- Average final depth: 12.5 m");
        assert_eq!(lines[6], "- Average groundwater depth: -");
        assert_eq!(lines[7], "- Average SPT N60: 14.0");
        assert_eq!(lines[8], "- Dominant methods: Rotary (2), Auger (1)");
        assert_eq!(lines[9], "- Dominant USCS classes: -");
        assert_eq!(lines[10], "");
        assert_eq!(lines[11], "Highlights:");
        assert_eq!(lines[12], "- 2024-02-20 | BH-3 at Harbour Link (Yard): depth 15.0 m");
    }

    #[test]
    fn test_render_summary_text_without_label() {
        let text = render_summary_text(Period::Monthly, None, &BoringStats::default(), &[]);
        assert!(text.starts_with("Soil boring monthly summary (latest interval)"));
        assert!(text.ends_with("Highlights:"));
    }

    #[test]
    fn test_generate_markdown_dashboard() {
        let report = DashboardReport {
            total_boreholes: 1,
            avg_final_depth_m: Some(18.5),
            avg_groundwater_depth_m: None,
            total_meterage_m: 18.5,
            active_projects: 1,
            project_list: vec!["Quay Wall".to_string()],
            method_breakdown: ["Sonic"].into_iter().collect(),
            uscs_breakdown: Tally::new(),
            top_contractor: None,
            period_range: PeriodRange::default(),
            period_label: Some("2024-06-03 to 2024-06-03".to_string()),
            recent_reports: vec![RecentReport {
                borehole_id: "BH-5".to_string(),
                project: "Quay Wall".to_string(),
                site: "Berth 2".to_string(),
                start_date: "2024-06-03".to_string(),
                final_depth_m: Some(18.5),
                groundwater_depth_m: None,
                method: "Sonic".to_string(),
            }],
            narrative: Some("One borehole completed.".to_string()),
        };

        let markdown = generate_markdown_dashboard(&report);
        assert!(markdown.contains("# Soil Boring Dashboard"));
        assert!(markdown.contains("## Executive Briefing\n\nOne borehole completed."));
        assert!(markdown.contains("### Drilling Methods"));
        assert!(!markdown.contains("### USCS Classes"));
        assert!(markdown.contains("| BH-5 | Quay Wall | Berth 2 | 2024-06-03 | 18.5 | - | Sonic |"));
    }

    #[test]
    fn test_generate_markdown_answer() {
        let answer = QaAnswer {
            answer: "Not found in data".to_string(),
            context: "BoreholeID,ProjectName\nBH-1,Quay Wall".to_string(),
        };
        let markdown = generate_markdown_answer("Who drilled BH-9? ", &answer);
        assert!(markdown.starts_with("## Who drilled BH-9?\n\nNot found in data\n"));
        assert!(markdown.contains("BH-1,Quay Wall"));

        let bare = QaAnswer {
            answer: "ok".to_string(),
            context: String::new(),
        };
        assert!(!generate_markdown_answer("q", &bare).contains("<details>"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_stats()).unwrap();
        assert!(json.contains("\"method_breakdown\""));
        assert!(json.contains("\"Rotary\": 2"));
        assert!(json.contains("\"avg_groundwater_depth\": null"));
    }
}
