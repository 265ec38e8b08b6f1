//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! 两种用法：
//! - `MockLlmClient::default()`：按 system prompt 识别阶段，返回固定的计划 / 工具调用 / 反思，跑通完整流程；
//! - `MockLlmClient::scripted(...)`：按顺序返回预置响应（可包含传输错误），脚本耗尽后回落到固定响应。
//!
//! 每次调用的 (system, user) 都会被记录，便于断言调用次数与 prompt 内容；
//! token 用量按空白分词粗略估算。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, TokenUsage};
use crate::memory::{Message, Role};

const CANNED_PLAN: &str = "1. Design the output content\n2. Save the result to output.txt";
const CANNED_TOOL_CALL: &str =
    r#"{"tool": "write_file", "args": {"path": "output.txt", "content": "Generated by the mock backend.\n"}}"#;
const CANNED_REFLECTION: &str = "Created output.txt and saved the generated content to it.";

/// 一次记录下来的调用
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    usage: TokenUsage,
}

impl MockLlmClient {
    /// 按顺序返回给定文本
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted_results(responses.into_iter().map(|s| Ok(s.into())))
    }

    /// 按顺序返回给定结果（可模拟传输错误）
    pub fn scripted_results<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, LlmError>>,
    {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            usage: TokenUsage::new(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn canned(system: &str) -> String {
        if system.contains("PLANNING MODULE") {
            CANNED_PLAN.to_string()
        } else if system.contains("EXECUTOR MODULE") {
            CANNED_TOOL_CALL.to_string()
        } else {
            CANNED_REFLECTION.to_string()
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn name(&self) -> &str {
        "mock"
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let join = |role: Role| {
            messages
                .iter()
                .filter(|m| m.role == role)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        let call = RecordedCall {
            system: join(Role::System),
            user: join(Role::User),
        };

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let response = match next {
            Some(r) => r,
            None => Ok(Self::canned(&call.system)),
        };

        if let Ok(text) = &response {
            let prompt_words = messages
                .iter()
                .map(|m| m.content.split_whitespace().count())
                .sum::<usize>();
            self.usage
                .add(prompt_words as u64, text.split_whitespace().count() as u64);
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        response
    }
}
