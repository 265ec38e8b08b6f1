//! 引擎错误类型
//!
//! 所有终止性失败都以 EngineError 从 Orchestrator::run 抛出；调用方（CLI / HTTP）负责转为用户可见的错误。

use thiserror::Error;

use crate::llm::LlmError;
use crate::memory::MemoryError;

/// 任务执行过程中可能出现的错误（传输、计划违规、执行解析、反思校验、工具、配置）
#[derive(Error, Debug)]
pub enum EngineError {
    /// LLM 传输失败：不在引擎内重试，直接终止本次 run
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// 计划文本未通过结构校验（规则名 + 详情）
    #[error("Planner violation [{rule}]: {detail}")]
    PlanViolation { rule: String, detail: String },

    #[error("EXECUTE phase violation: {0}")]
    ExecuteFailed(String),

    #[error("Invalid reflection after retry: {0}")]
    InvalidReflection(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Path escape attempt: {0}")]
    PathEscape(String),

    /// 循环结束后 plan_valid 为 false，携带 last_error
    #[error("Plan invalidated: {0}")]
    PlanInvalidated(String),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Config error: {0}")]
    Config(String),
}

impl EngineError {
    /// 是否为 LLM 传输层失败（区别于内容违规）
    pub fn is_transport(&self) -> bool {
        matches!(self, EngineError::Llm(_))
    }
}
