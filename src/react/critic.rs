//! Critic：反思阶段与证据校验
//!
//! 任务循环结束后请 LLM 给出事后总结；总结必须以产物为证据：
//! 至少已有一个产物、文本点名至少一个产物、并包含完成类动词。
//! 校验失败会重试（默认共 2 次），仍失败则整个任务失败。

use std::sync::Arc;

use crate::core::retry::{generate_validated, GenerationError};
use crate::core::{EngineError, TaskState};
use crate::llm::LlmClient;
use crate::react::rules::{Rule, RuleSet, Violation};

/// 完成信号词
const COMPLETION_SIGNALS: &[&str] = &["saved", "written", "created", "stored", "persisted", "completed"];

pub struct ArtifactsProducedRule;

impl Rule<[String]> for ArtifactsProducedRule {
    fn name(&self) -> &'static str {
        "artifacts_produced"
    }

    fn check(&self, _text: &str, artifacts: &[String]) -> Result<(), String> {
        if artifacts.is_empty() {
            Err("no artifacts were produced".to_string())
        } else {
            Ok(())
        }
    }
}

pub struct MentionsArtifactRule;

impl Rule<[String]> for MentionsArtifactRule {
    fn name(&self) -> &'static str {
        "mentions_artifact"
    }

    fn check(&self, text: &str, artifacts: &[String]) -> Result<(), String> {
        let lower = text.to_lowercase();
        if artifacts.iter().any(|a| lower.contains(&a.to_lowercase())) {
            Ok(())
        } else {
            Err(format!("reflection names none of [{}]", artifacts.join(", ")))
        }
    }
}

pub struct CompletionSignalRule;

impl Rule<[String]> for CompletionSignalRule {
    fn name(&self) -> &'static str {
        "completion_signal"
    }

    fn check(&self, text: &str, _artifacts: &[String]) -> Result<(), String> {
        let lower = text.to_lowercase();
        if COMPLETION_SIGNALS.iter().any(|w| lower.contains(w)) {
            Ok(())
        } else {
            Err("reflection contains no completion signal".to_string())
        }
    }
}

/// 反思校验规则集
pub fn reflection_rules() -> RuleSet<[String]> {
    RuleSet::new()
        .with(ArtifactsProducedRule)
        .with(MentionsArtifactRule)
        .with(CompletionSignalRule)
}

pub fn validate_reflection(text: &str, artifacts: &[String]) -> Result<(), Violation> {
    reflection_rules().validate(text, artifacts)
}

fn build_reflect_prompt(summary: &str, tool_result: Option<&str>, attempt: usize, budget: usize) -> String {
    format!(
        "TASK STATE:\n{}\n\nTOOL RESULT:\n{}\n\nProvide the post-mortem report now. This is attempt {}/{}.",
        summary.trim_end(),
        tool_result.unwrap_or("None"),
        attempt,
        budget
    )
}

/// Critic：持有 LLM、reflect system prompt、尝试预算与校验规则
pub struct Critic {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    attempts: usize,
    rules: RuleSet<[String]>,
}

impl Critic {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>, attempts: usize) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            attempts,
            rules: reflection_rules(),
        }
    }

    /// 返回首个通过校验的总结；全部失败时返回 InvalidReflection
    pub async fn reflect(
        &self,
        state: &TaskState,
        tool_result: Option<&str>,
    ) -> Result<String, EngineError> {
        let summary = state.summary();
        let artifacts = state.artifacts.as_slice();
        let budget = self.attempts.max(1);

        let result = generate_validated(
            self.llm.as_ref(),
            &self.system_prompt,
            budget,
            |attempt| build_reflect_prompt(&summary, tool_result, attempt, budget),
            |text| {
                self.rules
                    .validate(text, artifacts)
                    .map(|_| text.trim().to_string())
                    .map_err(|v| v.to_string())
            },
        )
        .await;

        match result {
            Ok(reflection) => Ok(reflection),
            Err(GenerationError::Transport(e)) => Err(e.into()),
            Err(GenerationError::Exhausted { last_error, .. }) => {
                Err(EngineError::InvalidReflection(last_error))
            }
        }
    }
}
