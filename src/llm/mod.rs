//! LLM 层：客户端抽象与实现（Ollama / OpenAI 兼容 / DeepSeek / Mock），启动时按配置选择

pub mod deepseek;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT};
pub use mock::{MockLlmClient, RecordedCall};
pub use ollama::{OllamaClient, OLLAMA_DEFAULT_MODEL, OLLAMA_DEFAULT_URL};
pub use openai::OpenAiClient;
pub use traits::{LlmClient, LlmError, TokenUsage};

use crate::config::AppConfig;
use crate::core::EngineError;

/// 根据 [llm].provider 选择后端：ollama / openai / deepseek / mock
pub fn create_llm_from_config(cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, EngineError> {
    let llm = &cfg.llm;
    let provider = llm.provider.to_lowercase();
    let client: Arc<dyn LlmClient> = match provider.as_str() {
        "ollama" | "local" => {
            let model = llm.model.as_deref().unwrap_or(OLLAMA_DEFAULT_MODEL);
            tracing::info!(model, "Using Ollama LLM");
            Arc::new(OllamaClient::new(
                llm.base_url.as_deref(),
                model,
                llm.temperature,
                llm.timeouts.request,
            ))
        }
        "openai" => {
            let model = llm
                .openai
                .model
                .clone()
                .or_else(|| llm.model.clone())
                .unwrap_or_else(|| "gpt-4o-mini".to_string());
            tracing::info!(model = %model, "Using OpenAI LLM");
            Arc::new(
                OpenAiClient::new(
                    llm.base_url.as_deref(),
                    &model,
                    std::env::var("OPENAI_API_KEY").ok().as_deref(),
                )
                .with_temperature(llm.temperature),
            )
        }
        "deepseek" => Arc::new(create_deepseek_client(llm)),
        "mock" => {
            tracing::warn!("Using Mock LLM");
            Arc::new(MockLlmClient::default())
        }
        other => {
            return Err(EngineError::Config(format!("unknown LLM provider: {other}")));
        }
    };
    Ok(client)
}
