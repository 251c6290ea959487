//! Relevance-ranked data snapshot for question answering.
//!
//! Builds a bounded CSV excerpt of the record set, putting the records that
//! mention the question's terms first.

use crate::analysis::{display_float, normalize_dated};
use crate::models::{CanonicalRecord, RawRecord};
use std::collections::HashSet;
use tracing::debug;

/// Default number of rows included in a snapshot.
pub const DEFAULT_MAX_ROWS: usize = 30;

const CSV_HEADER: &str =
    "BoreholeID,Project,Site,StartDate,Method,FinalDepth_m,USCS,GroundwaterDepth_m,AvgSPT,Remarks";

const CONTEXT_PREAMBLE: &str = "You are assisting geotechnical engineers with soil boring logs. \
Use the structured CSV data and answer precisely from it.";

/// Lower-cased question terms of at least 3 characters, edge punctuation removed.
pub fn question_tokens(question: &str) -> HashSet<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() >= 3)
        .map(|t| t.trim_matches(|c| c == ',' || c == '.').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Number of searchable fields containing any token (0 to 4).
pub fn relevance(record: &CanonicalRecord, tokens: &HashSet<String>) -> usize {
    [
        &record.project,
        &record.site,
        &record.borehole_id,
        &record.soil_description,
    ]
    .into_iter()
    .map(|field| field.to_lowercase())
    .filter(|field| tokens.iter().any(|t| field.contains(t.as_str())))
    .count()
}

fn optional(value: Option<f64>) -> String {
    value.map(display_float).unwrap_or_default()
}

fn csv_row(r: &CanonicalRecord) -> String {
    [
        r.borehole_id.clone(),
        r.project.clone(),
        r.site.clone(),
        r.start_date.clone(),
        r.method.clone(),
        optional(r.final_depth),
        r.uscs.clone(),
        optional(r.groundwater_depth),
        optional(r.avg_spt),
        r.remarks.replace(',', ";"),
    ]
    .join(",")
}

/// Build the grounding snapshot for a question.
pub fn build_context(question: &str, records: &[RawRecord], max_rows: usize) -> String {
    // oldest-first with ties in source order; the ranking sort below is stable
    let rows = normalize_dated(records);

    let tokens = question_tokens(question);
    let mut ranked: Vec<(usize, CanonicalRecord)> = rows
        .into_iter()
        .map(|r| (relevance(&r, &tokens), r))
        .collect();
    ranked.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| b.start_dt.cmp(&a.start_dt)));
    ranked.truncate(max_rows);

    debug!(
        "Context snapshot: {} rows for {} question tokens",
        ranked.len(),
        tokens.len()
    );

    let body: Vec<String> = ranked.iter().map(|(_, r)| csv_row(r)).collect();
    format!("{}\n{}\n{}", CONTEXT_PREAMBLE, CSV_HEADER, body.join("\n"))
}
