//! LLM 客户端抽象
//!
//! 所有后端（Ollama / OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient::complete；
//! 引擎只使用 generate(system, user)，单次同步语义，传输层不做重试。

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

/// LLM 传输层错误：连接失败、请求失败、响应格式异常
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("could not connect to LLM backend: {0}")]
    Connection(String),

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("unexpected LLM response: {0}")]
    InvalidResponse(String),
}

/// Token 使用统计（累计值）
#[derive(Debug, Default)]
pub struct TokenUsage {
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    total_tokens: AtomicU64,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 后端名称（日志用）
    fn name(&self) -> &str;

    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// system + user 两段式调用
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let messages = [Message::system(system_prompt), Message::user(user_prompt)];
        self.complete(&messages).await
    }

    /// 累计 token 使用：(prompt, completion, total)；不统计的后端返回 (0, 0, 0)
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
