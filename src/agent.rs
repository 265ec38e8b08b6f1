//! 无界面运行时装配
//!
//! 供 CLI 与 HTTP 前端共用：从 AppConfig 构建工作目录、工具执行器、长期记忆、LLM 与 Orchestrator。

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{load_config, AppConfig};
use crate::core::{EngineError, EngineSettings, Orchestrator};
use crate::llm::create_llm_from_config;
use crate::memory::FileLongTerm;
use crate::tools::{ToolExecutor, ToolRegistry};

/// 读取配置，失败时记录警告并退回默认值
pub fn load_config_or_default(config_path: Option<PathBuf>) -> AppConfig {
    load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config load failed, using defaults");
        AppConfig::default()
    })
}

/// 按配置装配 Orchestrator；工作目录不存在时创建
pub fn build_orchestrator(cfg: &AppConfig) -> Result<Orchestrator, EngineError> {
    let workspace = cfg.workspace();
    std::fs::create_dir_all(&workspace).map_err(|e| {
        EngineError::Config(format!("cannot create workspace {}: {e}", workspace.display()))
    })?;
    let workspace = workspace.canonicalize().map_err(|e| {
        EngineError::Config(format!("cannot resolve workspace {}: {e}", workspace.display()))
    })?;

    let tools = ToolExecutor::new(
        ToolRegistry::with_file_tools(&workspace),
        cfg.tools.tool_timeout_secs,
    );
    let memory_path = cfg.long_term_path(&workspace);
    let long_term = Arc::new(FileLongTerm::open(&memory_path)?);
    let llm = create_llm_from_config(cfg)?;

    tracing::info!(
        workspace = %workspace.display(),
        memory = %memory_path.display(),
        provider = llm.name(),
        "orchestrator ready"
    );

    Ok(Orchestrator::new(
        llm,
        tools,
        long_term,
        EngineSettings::from_config(cfg),
    ))
}
