//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PRAXIS__*` 覆盖（双下划线表示嵌套，如 `PRAXIS__LLM__PROVIDER=openai`）。

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub engine: EngineSection,
    pub tools: ToolsSection,
    pub memory: MemorySection,
    pub server: ServerSection,
}

/// [app] 段：工作目录、短期记忆轮数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// 沙箱根目录，未设置时用 ./workspace
    pub workspace_root: Option<PathBuf>,
    /// 规划 prompt 中保留的对话轮数（短期记忆）
    pub max_context_turns: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            workspace_root: None,
            max_context_turns: 5,
        }
    }
}

/// [llm] 段：后端选择、模型、温度与请求超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：ollama / openai / deepseek / mock
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub deepseek: LlmModelSection,
    pub openai: LlmModelSection,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: None,
            base_url: None,
            temperature: 0.2,
            deepseek: LlmModelSection::default(),
            openai: LlmModelSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmModelSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒），仅作用于传输层
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [engine] 段：执行 / 反思阶段的尝试次数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub execute_attempts: usize,
    pub reflect_attempts: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            execute_attempts: 2,
            reflect_attempts: 2,
        }
    }
}

/// [tools] 段：单次工具调用超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 30,
        }
    }
}

/// [memory] 段：长期记忆文件与检索条数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    /// 未设置时为 <workspace>/memory/long_term.json
    pub long_term_path: Option<PathBuf>,
    /// 规划时注入的历史记录上限
    pub recall_limit: usize,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            long_term_path: None,
            recall_limit: 3,
        }
    }
}

/// [server] 段：HTTP 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

impl AppConfig {
    /// 工作目录：配置 > 当前目录下的 workspace
    pub fn workspace(&self) -> PathBuf {
        self.app.workspace_root.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("workspace")
        })
    }

    /// 长期记忆文件路径：配置 > <workspace>/memory/long_term.json
    pub fn long_term_path(&self, workspace: &Path) -> PathBuf {
        self.memory
            .long_term_path
            .clone()
            .unwrap_or_else(|| workspace.join("memory").join("long_term.json"))
    }
}

/// 从 config 目录加载配置，环境变量 PRAXIS__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PRAXIS__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PRAXIS")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
