//! 带校验的有限次生成
//!
//! 执行阶段与反思阶段共用：每次尝试调用一次 LLM，把输出交给 validate；
//! 通过即返回，失败则记录原因并进入下一次尝试，预算耗尽后返回最后一次失败原因。
//! 传输错误不计入预算，直接返回。

use crate::llm::{LlmClient, LlmError};

/// 生成失败：传输层错误或内容校验预算耗尽
#[derive(Debug)]
pub enum GenerationError {
    Transport(LlmError),
    Exhausted { attempts: usize, last_error: String },
}

/// 最多尝试 `budget` 次（至少 1 次）；`prompt(attempt)` 生成第 attempt 次（从 1 开始）的 user prompt
pub async fn generate_validated<T, P, V>(
    llm: &dyn LlmClient,
    system_prompt: &str,
    budget: usize,
    mut prompt: P,
    mut validate: V,
) -> Result<T, GenerationError>
where
    P: FnMut(usize) -> String,
    V: FnMut(&str) -> Result<T, String>,
{
    let budget = budget.max(1);
    let mut last_error = String::new();

    for attempt in 1..=budget {
        let user_prompt = prompt(attempt);
        let output = llm
            .generate(system_prompt, &user_prompt)
            .await
            .map_err(GenerationError::Transport)?;

        match validate(&output) {
            Ok(value) => return Ok(value),
            Err(reason) => {
                tracing::warn!(attempt, budget, reason = %reason, "generation rejected");
                last_error = reason;
            }
        }
    }

    Err(GenerationError::Exhausted {
        attempts: budget,
        last_error,
    })
}
