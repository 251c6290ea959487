//! Best-effort narrative generation for reports.
//!
//! A failed narrative never fails the report around it: errors are logged
//! and the narrative comes back as `None`.

use crate::llm::{LlmError, TextGenerator};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for narrative requests.
pub const NARRATIVE_TIMEOUT_SECS: u64 = 90;

/// Turns structured report payloads into prose via a [`TextGenerator`].
#[derive(Clone)]
pub struct NarrativeGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl NarrativeGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self {
            generator: Some(generator),
            timeout,
        }
    }

    /// A generator that never produces narratives.
    pub fn disabled() -> Self {
        Self {
            generator: None,
            timeout: Duration::from_secs(NARRATIVE_TIMEOUT_SECS),
        }
    }

    /// Generate a narrative, or `None` when the payload is empty or generation fails.
    pub async fn generate_narrative(
        &self,
        title: &str,
        instruction: &str,
        payload: &Value,
    ) -> Option<String> {
        if is_empty_payload(payload) {
            return None;
        }

        match self.try_generate(title, instruction, payload).await {
            Ok(Some(text)) => Some(text),
            Ok(None) => None,
            Err(e) => {
                warn!("Narrative generation failed for '{}': {}", title, e);
                None
            }
        }
    }

    async fn try_generate(
        &self,
        title: &str,
        instruction: &str,
        payload: &Value,
    ) -> Result<Option<String>, LlmError> {
        let Some(generator) = &self.generator else {
            debug!("Narrative generation disabled, skipping '{}'", title);
            return Ok(None);
        };

        let context = serialize_context(title, payload);
        debug!(
            "Requesting narrative '{}' from {} ({} bytes of context)",
            title,
            generator.name(),
            context.len()
        );

        let text = generator
            .ask(instruction, Some(&context), &[], self.timeout)
            .await?;
        Ok(Some(text))
    }
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn serialize_context(title: &str, payload: &Value) -> String {
    let wrapped = json!({ "title": title, "data": payload });
    serde_json::to_string_pretty(&wrapped).unwrap_or_else(|_| payload.to_string())
}
