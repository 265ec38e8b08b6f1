//! Planner：计划阶段
//!
//! 调用 LLM 得到编号计划；计划文本必须通过结构校验（不含代码、不含项目符号），
//! 否则视为不可恢复的编写错误直接终止，不重试。通过后按编号行解析为步骤序列。

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::core::{EngineError, TaskState};
use crate::llm::LlmClient;
use crate::memory::TaskRecord;
use crate::react::rules::{Rule, RuleSet, Violation};

/// 代码痕迹：定义关键字、导入、代码块、打印调用、入口守卫
const FORBIDDEN_CODE_TOKENS: &[&str] = &[
    "def ",
    "class ",
    "import ",
    "```",
    "print(",
    "console.log(",
    "if __name__",
];

/// 作为语句开头的循环关键字
const LOOP_KEYWORDS: &[&str] = &["for ", "while "];

/// 允许以项目符号开头的说明行前缀（小写）
const HEADER_PREFIXES: &[&str] = &["plan", "here is"];

pub struct ForbiddenTokenRule;

impl Rule<()> for ForbiddenTokenRule {
    fn name(&self) -> &'static str {
        "forbidden_code_token"
    }

    fn check(&self, text: &str, _ctx: &()) -> Result<(), String> {
        match FORBIDDEN_CODE_TOKENS.iter().find(|t| text.contains(*t)) {
            Some(token) => Err(format!("forbidden token detected -> {:?}", token)),
            None => Ok(()),
        }
    }
}

pub struct LoopStatementRule;

impl Rule<()> for LoopStatementRule {
    fn name(&self) -> &'static str {
        "loop_statement"
    }

    fn check(&self, text: &str, _ctx: &()) -> Result<(), String> {
        for line in text.lines().map(str::trim) {
            if LOOP_KEYWORDS.iter().any(|k| line.starts_with(k)) {
                return Err(format!("loop statement detected -> {:?}", line));
            }
        }
        Ok(())
    }
}

pub struct BulletLineRule;

impl Rule<()> for BulletLineRule {
    fn name(&self) -> &'static str {
        "bullet_line"
    }

    fn check(&self, text: &str, _ctx: &()) -> Result<(), String> {
        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            let lower = line.to_lowercase();
            if HEADER_PREFIXES.iter().any(|h| lower.starts_with(h)) {
                continue;
            }
            if line.starts_with('*') || line.starts_with('-') {
                return Err(format!("explanations or substeps detected -> {:?}", line));
            }
        }
        Ok(())
    }
}

/// 计划校验规则集
pub fn plan_rules() -> RuleSet<()> {
    RuleSet::new()
        .with(ForbiddenTokenRule)
        .with(LoopStatementRule)
        .with(BulletLineRule)
}

pub fn validate_plan(text: &str) -> Result<(), Violation> {
    plan_rules().validate(text, &())
}

fn step_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[.)]\s*(.*)$").expect("step marker regex is valid"))
}

/// 解析编号行（"1. xxx" / "2) xxx"）为步骤；其余行忽略
pub fn parse_plan(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            step_marker()
                .captures(line.trim())
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .collect()
}

/// 历史记录 → 规划提示（最近的 limit 条，每条一行）
pub fn planning_hint(records: &[TaskRecord], limit: usize) -> String {
    let start = records.len().saturating_sub(limit);
    records[start..]
        .iter()
        .map(|r| {
            let summary: String = r
                .summary
                .lines()
                .next()
                .unwrap_or("")
                .chars()
                .take(160)
                .collect();
            format!(
                "- Previously \"{}\" produced [{}]: {}",
                r.task_signature,
                r.artifacts.join(", "),
                summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_plan_prompt(task: &str, context: &str, hint: &str) -> String {
    let mut prompt = String::new();
    if !context.trim().is_empty() {
        prompt.push_str(&format!("CONTEXT:\n{}\n\n", context));
    }
    if !hint.trim().is_empty() {
        prompt.push_str(&format!("PRIOR OUTCOMES:\n{}\n\n", hint));
    }
    prompt.push_str(&format!(
        "USER REQUEST:\n{}\n\nGenerate the high-level plan now.",
        task
    ));
    prompt
}

/// Planner：持有 LLM、system prompt 与计划校验规则
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    rules: RuleSet<()>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            rules: plan_rules(),
        }
    }

    /// 生成、校验并解析计划，结果写入 state；校验失败时标记计划无效并返回 PlanViolation
    pub async fn plan(
        &self,
        state: &mut TaskState,
        task: &str,
        context: &str,
        hint: &str,
    ) -> Result<(), EngineError> {
        let prompt = build_plan_prompt(task, context, hint);
        let raw = self.llm.generate(&self.system_prompt, &prompt).await?;
        tracing::debug!(plan = %raw, "raw plan");

        if let Err(v) = self.rules.validate(&raw, &()) {
            state.invalidate_plan(format!("Planner violation: {}", v));
            return Err(EngineError::PlanViolation {
                rule: v.rule.to_string(),
                detail: v.detail,
            });
        }

        let steps = parse_plan(&raw);
        tracing::info!(steps = steps.len(), "plan accepted");
        state.set_plan(steps);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_clean_numbered_plan_passes() {
        let plan = "Here is the plan:\n1. Design the algorithm\n2. Save the result to disk\n";
        assert!(validate_plan(plan).is_ok());
    }

    #[test]
    fn test_bullet_line_rejected() {
        let v = validate_plan("1. Design it\n- with sub-step").unwrap_err();
        assert_eq!(v.rule, "bullet_line");
        let v = validate_plan("* Analyze the input").unwrap_err();
        assert_eq!(v.rule, "bullet_line");
    }

    #[test]
    fn test_header_lines_are_exempt() {
        assert!(validate_plan("- Plan for sorting\n1. Design it").is_err());
        assert!(validate_plan("Plan:\n1. Design it").is_ok());
        assert!(validate_plan("here is what I will do\n1. Design it").is_ok());
    }

    #[test]
    fn test_code_tokens_rejected() {
        for text in [
            "1. def sort(xs)",
            "import os",
            "```\n1. Design\n```",
            "1. print(x)",
            "if __name__ == '__main__':",
            "1. Define a class to hold results",
        ] {
            let v = validate_plan(text).unwrap_err();
            assert_eq!(v.rule, "forbidden_code_token", "text: {text}");
        }
    }

    #[test]
    fn test_loop_statement_rejected() {
        let v = validate_plan("1. Design it\nfor x in xs:").unwrap_err();
        assert_eq!(v.rule, "loop_statement");
        assert!(validate_plan("1. Loop for each item").is_ok());
    }

    #[test]
    fn test_parse_plan_extracts_numbered_steps() {
        let text = "Plan:\n1. Design the algorithm\n2) Implement the sort\n  3.Save the result\nNote that this is it";
        assert_eq!(
            parse_plan(text),
            vec!["Design the algorithm", "Implement the sort", "Save the result"]
        );
        assert!(parse_plan("no steps here").is_empty());
    }

    #[test]
    fn test_planning_hint_takes_latest_records() {
        let records = vec![
            TaskRecord::new("a", &["a.txt".to_string()], "Created a.txt"),
            TaskRecord::new("b", &["b.txt".to_string()], "Created b.txt\nmore"),
        ];
        let hint = planning_hint(&records, 1);
        assert_eq!(hint, "- Previously \"b\" produced [b.txt]: Created b.txt");
        assert!(planning_hint(&[], 3).is_empty());
    }

    #[tokio::test]
    async fn test_plan_violation_invalidates_state() {
        let llm = Arc::new(MockLlmClient::scripted(["1. Design\n- sub-step"]));
        let planner = Planner::new(llm.clone(), "PLANNING MODULE");
        let mut state = TaskState::new();
        state.reset("task");

        let err = planner.plan(&mut state, "task", "", "").await.unwrap_err();
        assert!(matches!(err, EngineError::PlanViolation { ref rule, .. } if rule == "bullet_line"));
        assert!(!state.plan_valid);
        assert!(state.last_error.unwrap().contains("bullet_line"));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_plan_prompt_carries_hint_and_context() {
        let llm = Arc::new(MockLlmClient::scripted(["1. Save the output"]));
        let planner = Planner::new(llm.clone(), "PLANNING MODULE");
        let mut state = TaskState::new();
        state.reset("task");

        planner
            .plan(&mut state, "task", "USER: earlier", "- Previously \"x\" produced [x.txt]: ok")
            .await
            .unwrap();
        assert_eq!(state.plan, vec!["Save the output"]);
        let user = &llm.calls()[0].user;
        assert!(user.contains("CONTEXT:\nUSER: earlier"));
        assert!(user.contains("PRIOR OUTCOMES:"));
        assert!(user.contains("USER REQUEST:\ntask"));
    }
}
