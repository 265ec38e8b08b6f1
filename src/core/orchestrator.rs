//! 任务编排器：计划 → 逐步执行 → 反思 → 写入长期记忆
//!
//! Orchestrator 持有各阶段组件与一份 TaskState（每次 run 开头 reset），
//! 各阶段以 `&mut TaskState` 显式推进状态；任何终止性失败都以 EngineError 返回，
//! 只有在执行循环与反思都成功后才构造结果并提交长期记忆。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::config::AppConfig;
use crate::core::classifier::{classify_step, StepKind};
use crate::core::intent::infer_artifact_intent;
use crate::core::{EngineError, TaskState};
use crate::llm::LlmClient;
use crate::memory::{ConversationMemory, LongTermMemory, Message};
use crate::prompts::Prompts;
use crate::react::{planning_hint, Critic, ExecutionDecision, Planner, StepExecutor};
use crate::tools::{tool_call_schema_json, ToolExecutor};

/// 一次成功任务的结构化结果
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task: String,
    pub steps_completed: usize,
    pub total_steps: usize,
    pub artifacts: Vec<String>,
    pub reflection: Option<String>,
}

/// 编排参数：尝试预算、上下文轮数、历史检索条数与各阶段 prompt
#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub execute_attempts: usize,
    pub reflect_attempts: usize,
    pub max_context_turns: usize,
    pub recall_limit: usize,
    pub prompts: Prompts,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            execute_attempts: 2,
            reflect_attempts: 2,
            max_context_turns: 5,
            recall_limit: 3,
            prompts: Prompts::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            execute_attempts: cfg.engine.execute_attempts,
            reflect_attempts: cfg.engine.reflect_attempts,
            max_context_turns: cfg.app.max_context_turns,
            recall_limit: cfg.memory.recall_limit,
            prompts: Prompts::load(),
        }
    }
}

pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    planner: Planner,
    executor: StepExecutor,
    critic: Critic,
    tools: ToolExecutor,
    long_term: Arc<dyn LongTermMemory>,
    conversation: ConversationMemory,
    recall_limit: usize,
    state: TaskState,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: ToolExecutor,
        long_term: Arc<dyn LongTermMemory>,
        settings: EngineSettings,
    ) -> Self {
        // 执行阶段 system prompt 追加可用工具与调用格式 schema
        let executor_prompt = format!(
            "{}\nAvailable tools:\n{}\n\nTool call JSON schema:\n{}\n",
            settings.prompts.executor,
            tools.registry().to_schema_json(),
            tool_call_schema_json()
        );

        Self {
            planner: Planner::new(llm.clone(), settings.prompts.planner),
            executor: StepExecutor::new(llm.clone(), executor_prompt, settings.execute_attempts),
            critic: Critic::new(llm.clone(), settings.prompts.reflect, settings.reflect_attempts),
            llm,
            tools,
            long_term,
            conversation: ConversationMemory::new(settings.max_context_turns),
            recall_limit: settings.recall_limit,
            state: TaskState::new(),
        }
    }

    /// 当前（或最近一次）任务的状态
    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn conversation(&self) -> &ConversationMemory {
        &self.conversation
    }

    /// 后端累计 token 用量：(prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 运行一个任务直到完成或终止性失败
    pub async fn run(&mut self, user_input: &str) -> Result<TaskOutcome, EngineError> {
        let span = tracing::info_span!("task", run_id = %uuid::Uuid::new_v4());
        self.run_inner(user_input).instrument(span).await
    }

    async fn run_inner(&mut self, user_input: &str) -> Result<TaskOutcome, EngineError> {
        self.state.reset(user_input);
        let (_, _, tokens_before) = self.llm.token_usage();
        let context = self.conversation.context();
        self.conversation.push(Message::user(user_input));

        // 1. PLAN
        let records = self.long_term.recall(user_input);
        let hint = planning_hint(&records, self.recall_limit);
        if !records.is_empty() {
            tracing::info!(matches = records.len(), "long-term memory recalled");
        }
        self.planner
            .plan(&mut self.state, user_input, &context, &hint)
            .await?;

        // 2. EXECUTE
        let last_result = self.execute_loop(user_input).await?;

        // 3. REFLECT
        let reflection = self
            .critic
            .reflect(&self.state, last_result.as_deref())
            .await?;

        if !self.state.plan_valid {
            let reason = self
                .state
                .last_error
                .clone()
                .unwrap_or_else(|| "plan invalidated".to_string());
            return Err(EngineError::PlanInvalidated(reason));
        }

        // 只在成功路径提交；提交失败不影响返回结果
        if let Err(e) = self
            .long_term
            .store(user_input, &self.state.artifacts, &reflection)
        {
            tracing::warn!(error = %e, "long-term memory commit failed");
        }
        self.conversation.push(Message::assistant(reflection.clone()));

        let outcome = TaskOutcome {
            task: user_input.to_string(),
            steps_completed: self.state.current_step_index,
            total_steps: self.state.plan.len(),
            artifacts: self.state.artifacts.clone(),
            reflection: Some(reflection),
        };
        let (_, _, tokens_after) = self.llm.token_usage();
        tracing::info!(
            steps_completed = outcome.steps_completed,
            total_steps = outcome.total_steps,
            artifacts = ?outcome.artifacts,
            tokens = tokens_after.saturating_sub(tokens_before),
            "task completed"
        );
        Ok(outcome)
    }

    /// 逐步执行计划；返回最后一次工具输出（供反思阶段参考）
    async fn execute_loop(&mut self, task: &str) -> Result<Option<String>, EngineError> {
        let mut last_result = None;

        while self.state.plan_valid && !self.state.is_complete() {
            let Some(step) = self.state.current_step().map(str::to_string) else {
                break;
            };
            tracing::info!(
                step = self.state.current_step_index + 1,
                total = self.state.plan.len(),
                step_text = %step,
                artifacts = ?self.state.artifacts,
                "step"
            );

            if classify_step(&step) == StepKind::NonExecutable {
                self.state.advance_step();
                continue;
            }

            // 无意图时尝试推断；推断不到也继续执行
            if !self.state.has_artifact_intent() {
                if let Some(intent) = infer_artifact_intent(task, &step) {
                    tracing::debug!(name = %intent.name, role = %intent.role, "artifact intent inferred");
                    self.state.set_expected_artifact(intent);
                }
            }

            let decision = self.executor.decide(&mut self.state, &step).await?;
            if let ExecutionDecision::Call(call) = decision {
                self.state.record_tool(&call.tool);
                let output = self.tools.execute(&call.tool, call.args.clone()).await?;

                if call.tool == "write_file" {
                    if let Some(path) = call.args.get("path").and_then(|v| v.as_str()) {
                        let role = self.state.intent_role();
                        self.state.add_artifact(path, &role);
                    }
                }
                last_result = Some(output);
            }

            self.state.advance_step();
            self.state.clear_last_tool();
        }

        Ok(last_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::memory::InMemoryLongTerm;
    use crate::tools::ToolRegistry;

    fn orchestrator(
        llm: Arc<MockLlmClient>,
        workspace: &std::path::Path,
    ) -> (Orchestrator, Arc<InMemoryLongTerm>) {
        let memory = Arc::new(InMemoryLongTerm::new());
        let tools = ToolExecutor::new(ToolRegistry::with_file_tools(workspace), 5);
        let orch = Orchestrator::new(llm, tools, memory.clone(), EngineSettings::default());
        (orch, memory)
    }

    #[tokio::test]
    async fn test_non_executable_steps_make_no_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockLlmClient::scripted([
            "1. Analyze the data\n2. Design the layout",
            "irrelevant",
            "irrelevant",
        ]));
        let (mut orch, memory) = orchestrator(llm.clone(), dir.path());

        // 无产物：反思必然被拒绝
        let err = orch.run("Look at the data").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidReflection(_)));
        assert_eq!(orch.state().current_step_index, 2);
        // plan + 2 次反思，没有执行阶段调用
        assert_eq!(llm.call_count(), 3);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_write_without_intent_gets_unknown_role() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockLlmClient::scripted([
            "1. Store the report",
            r##"{"tool": "write_file", "args": {"path": "report.md", "content": "# Report"}}"##,
            "Created report.md.",
        ]));
        let (mut orch, memory) = orchestrator(llm, dir.path());

        let outcome = orch.run("Summarize the quarter").await.unwrap();
        assert_eq!(outcome.artifacts, vec!["report.md"]);
        assert_eq!(
            orch.state().artifact_roles.get("report.md").map(String::as_str),
            Some("unknown")
        );
        assert!(dir.path().join("report.md").exists());
        assert_eq!(memory.len(), 1);
        assert_eq!(orch.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_token_usage_reported_from_backend() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockLlmClient::default());
        let (mut orch, _) = orchestrator(llm.clone(), dir.path());
        assert_eq!(orch.token_usage(), (0, 0, 0));

        orch.run("Produce a short note").await.unwrap();
        let (prompt, completion, total) = orch.token_usage();
        assert!(prompt > 0 && completion > 0);
        assert_eq!(total, prompt + completion);
        assert_eq!(orch.token_usage(), llm.token_usage());

        orch.run("Produce another note").await.unwrap();
        assert!(orch.token_usage().2 > total);
    }
}
