//! Grounded question answering over the record set.

use crate::analysis::build_context;
use crate::llm::{ChatTurn, TextGenerator};
use crate::models::RawRecord;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Default timeout for direct questions.
pub const ASK_TIMEOUT_SECS: u64 = 60;

const ANSWER_GUARD: &str = "You are an assistant for soil boring & geotechnical logging. \
Answer ONLY using the provided data snapshot. \
If the answer cannot be found in the data, say 'Not found in data'. \
Be concise and structure your answer with short bullets where appropriate. \
Use the DATA SCHEMA types to interpret values (dates, times, numbers). \
When citing values, reference the exact column names. \
Consider prior turns in the conversation to answer follow-ups.";

/// Answer plus the data snapshot it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub context: String,
}

/// Inputs for a single question.
pub struct Question<'a> {
    pub text: &'a str,
    /// Extra caller-supplied context placed ahead of the data snapshot.
    pub user_context: Option<&'a str>,
    pub history: &'a [ChatTurn],
    pub max_rows: usize,
}

/// Combine caller context, the data snapshot and the answering guard.
fn grounded_context(user_context: Option<&str>, snapshot: &str) -> String {
    let prefix = match user_context.filter(|c| !c.is_empty()) {
        Some(c) => format!("{}\n\n", c),
        None => String::new(),
    };
    format!(
        "{}DATA SNAPSHOT (from CSV):\n{}\n\n{}",
        prefix, snapshot, ANSWER_GUARD
    )
}

/// Answer a free-text question from the records.
///
/// A generator failure becomes an "unavailable" answer rather than an error.
pub async fn answer_question(
    generator: &dyn TextGenerator,
    question: &Question<'_>,
    records: &[RawRecord],
    timeout: Duration,
) -> QaAnswer {
    let snapshot = build_context(question.text, records, question.max_rows);
    let context = grounded_context(question.user_context, &snapshot);

    info!("Asking {}: {}", generator.name(), question.text);

    let answer = match generator
        .ask(question.text, Some(&context), question.history, timeout)
        .await
    {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Question answering failed: {}", e);
            format!("AI service unavailable: {}", e)
        }
    };

    QaAnswer {
        answer,
        context: snapshot,
    }
}
