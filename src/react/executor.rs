//! 执行阶段：把单个计划步骤变成一次工具调用或明确的 NO_ACTION
//!
//! LLM 必须返回 `{"tool": ..., "args": {...}}` 或字面量 NO_ACTION；
//! 解析失败会重试（默认共 2 次），仍失败则标记计划无效并终止本次任务。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::retry::{generate_validated, GenerationError};
use crate::core::{EngineError, TaskState};
use crate::llm::LlmClient;

/// 「本步无需动作」的字面量
pub const NO_ACTION: &str = "NO_ACTION";

/// LLM 返回的 Tool Call（{"tool": "write_file", "args": {"path": "...", "content": "..."}}）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    pub args: Value,
}

/// 执行阶段的决定
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionDecision {
    NoAction,
    Call(ToolCall),
}

/// 整段输出须为 JSON，或整段为一个 ``` / ```json 代码块；夹在说明文字中的 JSON 视为格式错误
fn extract_json(text: &str) -> &str {
    let fenced = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"));
    match fenced {
        Some(body) => body.trim(),
        None => text,
    }
}

/// 解析执行阶段输出；错误信息用于重试日志与最终失败原因
pub fn parse_execution_output(output: &str) -> Result<ExecutionDecision, String> {
    let trimmed = output.trim();
    if trimmed.trim_matches('"') == NO_ACTION {
        return Ok(ExecutionDecision::NoAction);
    }

    let json_str = extract_json(trimmed);
    let value: Value = serde_json::from_str(json_str).map_err(|e| format!("{}: {}", e, json_str))?;

    let obj = value
        .as_object()
        .ok_or_else(|| format!("Malformed tool call: expected a JSON object, got {}", json_str))?;
    let tool = obj
        .get("tool")
        .and_then(|v| v.as_str())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| "Malformed tool call: missing \"tool\"".to_string())?;
    let args = obj
        .get("args")
        .ok_or_else(|| "Malformed tool call: missing \"args\"".to_string())?;

    Ok(ExecutionDecision::Call(ToolCall {
        tool: tool.to_string(),
        args: args.clone(),
    }))
}

fn build_execute_prompt(task: &str, step: &str, attempt: usize, budget: usize) -> String {
    format!(
        "TASK:\n{task}\n\nCURRENT STEP:\n{step}\n\nSTRICT RULES:\n\
         - Return ONLY valid JSON OR the string {NO_ACTION}\n\
         - Do NOT explain\n\
         - Do NOT summarize\n\
         - Do NOT plan\n\
         - Do NOT include extra text\n\n\
         This is attempt {attempt}/{budget}."
    )
}

/// 步骤执行器：持有 LLM、system prompt（含可用工具清单）与尝试预算
pub struct StepExecutor {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    attempts: usize,
}

impl StepExecutor {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>, attempts: usize) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            attempts,
        }
    }

    /// 为当前步骤取得决定；预算耗尽时标记计划无效并返回 ExecuteFailed
    pub async fn decide(
        &self,
        state: &mut TaskState,
        step: &str,
    ) -> Result<ExecutionDecision, EngineError> {
        let task = state.task.clone().unwrap_or_default();
        let budget = self.attempts.max(1);

        let result = generate_validated(
            self.llm.as_ref(),
            &self.system_prompt,
            budget,
            |attempt| build_execute_prompt(&task, step, attempt, budget),
            parse_execution_output,
        )
        .await;

        match result {
            Ok(decision) => Ok(decision),
            Err(GenerationError::Transport(e)) => Err(e.into()),
            Err(GenerationError::Exhausted { last_error, .. }) => {
                let reason = format!("EXECUTE failed after retry: {}", last_error);
                state.invalidate_plan(reason.clone());
                Err(EngineError::ExecuteFailed(reason))
            }
        }
    }
}
