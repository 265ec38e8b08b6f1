//! Ollama 本地模型客户端
//!
//! 调用原生 /api/generate 端点（非 OpenAI 兼容层），system 与 prompt 分字段传递，stream=false。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::llm::{LlmClient, LlmError};
use crate::memory::{Message, Role};

pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434/api/generate";
pub const OLLAMA_DEFAULT_MODEL: &str = "codellama:latest";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama 客户端：持有 reqwest Client、端点与模型名
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(url: Option<&str>, model: &str, temperature: f32, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.unwrap_or(OLLAMA_DEFAULT_URL).to_string(),
            model: model.to_string(),
            temperature,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// system 消息合并为 system 字段，其余按顺序拼成 prompt
    fn split_messages(messages: &[Message]) -> (Option<String>, String) {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let prompt: Vec<&str> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let system = if system.is_empty() {
            None
        } else {
            Some(system.join("\n\n"))
        };
        (system, prompt.join("\n\n"))
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let (system, prompt) = Self::split_messages(messages);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(format!(
                        "{} (is the Ollama server running at {}?)",
                        e, self.url
                    ))
                } else {
                    LlmError::Request(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(data.response.trim().to_string())
    }
}
