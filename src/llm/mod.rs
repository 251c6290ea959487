//! Text-generation collaborators.
//!
//! This module provides the trait the report pipeline talks to, the Ollama
//! implementation of it, and the two consumers: narrative generation for
//! reports and grounded question answering.

pub mod assistant;
pub mod narrative;
pub mod ollama;

pub use assistant::{answer_question, QaAnswer, Question, ASK_TIMEOUT_SECS};
pub use narrative::{NarrativeGenerator, NARRATIVE_TIMEOUT_SECS};
pub use ollama::{OllamaClient, OllamaConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors raised at the text-generation boundary.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("cannot connect to text-generation service at {0}")]
    Connect(String),
    #[error("text-generation service returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// One prior turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatTurn {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            content: Some(content.to_string()),
        }
    }
}

/// A service that answers a question given grounding context.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Ask a question with optional context and conversation history.
    async fn ask(
        &self,
        question: &str,
        context: Option<&str>,
        history: &[ChatTurn],
        timeout: Duration,
    ) -> Result<String, LlmError>;

    /// Name used in log lines.
    fn name(&self) -> &str;
}
