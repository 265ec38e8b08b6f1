//! Praxis - LLM 驱动的 计划 → 执行 → 反思 任务编排器
//!
//! 模块划分：
//! - **agent**: 按配置装配 Orchestrator（CLI / HTTP 共用）
//! - **api**: HTTP 接口（feature = "web"）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 任务状态、步骤分类、产物意图、重试与主编排器
//! - **llm**: LLM 客户端抽象与实现（Ollama / OpenAI 兼容 / DeepSeek / Mock）
//! - **memory**: 短期对话记忆与长期任务记录
//! - **observability**: tracing 初始化
//! - **prompts**: 各阶段 system prompt
//! - **react**: Planner、StepExecutor、Critic 与校验规则
//! - **tools**: 沙箱文件工具、注册表与执行器

pub mod agent;
#[cfg(feature = "web")]
pub mod api;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod prompts;
pub mod react;
pub mod tools;
