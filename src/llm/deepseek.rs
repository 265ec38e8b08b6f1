//! DeepSeek 后端：复用 OpenAI 兼容客户端，仅替换端点、默认模型与密钥来源

use crate::config::LlmSection;
use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 模型优先级：[llm.deepseek].model > [llm].model > DEEPSEEK_MODEL > deepseek-chat
fn resolve_model(llm: &LlmSection) -> String {
    llm.deepseek
        .model
        .clone()
        .or_else(|| llm.model.clone())
        .or_else(|| std::env::var("DEEPSEEK_MODEL").ok())
        .unwrap_or_else(|| DEEPSEEK_CHAT.to_string())
}

/// 密钥取 DEEPSEEK_API_KEY，缺失时退回 OPENAI_API_KEY
pub fn create_deepseek_client(llm: &LlmSection) -> OpenAiClient {
    let api_key = std::env::var("DEEPSEEK_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok();
    let base_url = llm.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL);
    let model = resolve_model(llm);
    tracing::info!(model = %model, base_url, "Using DeepSeek LLM");

    OpenAiClient::new(Some(base_url), &model, api_key.as_deref())
        .with_temperature(llm.temperature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_model_wins_over_generic_model() {
        let mut llm = LlmSection::default();
        llm.model = Some("generic".to_string());
        llm.deepseek.model = Some("deepseek-reasoner".to_string());
        assert_eq!(resolve_model(&llm), "deepseek-reasoner");

        llm.deepseek.model = None;
        assert_eq!(resolve_model(&llm), "generic");
    }
}
