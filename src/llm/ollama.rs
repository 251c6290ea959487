//! Ollama chat client.
//!
//! Sends non-streaming requests to the Ollama `/api/chat` endpoint.

use crate::llm::{ChatTurn, LlmError, TextGenerator};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Connection settings for the Ollama service.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "gpt-oss:120b-cloud".to_string(),
            temperature: 0.2,
        }
    }
}

/// Message in the chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// System prompt sent ahead of every request.
const SYSTEM_PROMPT: &str =
    "You analyze soil boring logs and geotechnical data to answer questions accurately.";

/// Assemble the message list: system prompt, context, history, then the question.
pub fn build_messages(question: &str, context: Option<&str>, history: &[ChatTurn]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::new("system", SYSTEM_PROMPT)];

    if let Some(context) = context.filter(|c| !c.is_empty()) {
        messages.push(ChatMessage::new("user", context));
    }

    for turn in history {
        let content = turn.content.as_deref().unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        let role = turn.role.as_deref().filter(|r| !r.is_empty()).unwrap_or("user");
        messages.push(ChatMessage::new(role, content));
    }

    messages.push(ChatMessage::new("user", question));
    messages
}

/// Client for a local or remote Ollama server.
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn ask(
        &self,
        question: &str,
        context: Option<&str>,
        history: &[ChatTurn],
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: build_messages(question, context, history),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!(
            "Sending chat request with {} messages to {}",
            request.messages.len(),
            self.config.model_name
        );

        let response = self
            .http_client
            .post(self.chat_url())
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(timeout.as_secs())
                } else if e.is_connect() {
                    LlmError::Connect(self.config.ollama_url.clone())
                } else {
                    LlmError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(timeout.as_secs())
            } else {
                LlmError::Malformed(e.to_string())
            }
        })?;

        Ok(chat_response
            .message
            .map(|m| m.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.config.model_name
    }
}
