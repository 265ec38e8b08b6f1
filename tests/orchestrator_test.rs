//! 编排器集成测试：脚本化 Mock LLM + 临时工作目录

use std::path::Path;
use std::sync::Arc;

use praxis::core::{EngineError, EngineSettings, Orchestrator};
use praxis::llm::{LlmError, MockLlmClient};
use praxis::memory::{FileLongTerm, InMemoryLongTerm, LongTermMemory};
use praxis::tools::{ToolExecutor, ToolRegistry};

const SORT_TASK: &str = "Write a Python function to sort a list of numbers and save it to sort_numbers.py";
const SORT_PLAN: &str = "1. Design the sorting algorithm\n2. Implement the sort function\n3. Save the code to sort_numbers.py";
const SORT_WRITE: &str = r#"{"tool": "write_file", "args": {"path": "sort_numbers.py", "content": "def sort_numbers(xs):\n    return sorted(xs)\n"}}"#;
const SORT_REFLECTION: &str = "Saved the sorting function to sort_numbers.py.";

fn build(
    llm: Arc<MockLlmClient>,
    workspace: &Path,
    memory: Arc<dyn LongTermMemory>,
) -> Orchestrator {
    let tools = ToolExecutor::new(ToolRegistry::with_file_tools(workspace), 5);
    Orchestrator::new(llm, tools, memory, EngineSettings::default())
}

fn sort_script() -> Vec<&'static str> {
    vec![SORT_PLAN, "NO_ACTION", SORT_WRITE, SORT_REFLECTION]
}

#[tokio::test]
async fn test_three_step_sort_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlmClient::scripted(sort_script()));
    let memory = Arc::new(InMemoryLongTerm::new());
    let mut orch = build(llm.clone(), dir.path(), memory.clone());

    let outcome = orch.run(SORT_TASK).await.unwrap();
    assert_eq!(outcome.task, SORT_TASK);
    assert_eq!(outcome.steps_completed, 3);
    assert_eq!(outcome.total_steps, 3);
    assert_eq!(outcome.artifacts, vec!["sort_numbers.py"]);
    assert_eq!(outcome.reflection.as_deref(), Some(SORT_REFLECTION));

    // plan + 2 次执行（设计步骤被跳过）+ reflect
    assert_eq!(llm.call_count(), 4);

    let written = std::fs::read_to_string(dir.path().join("sort_numbers.py")).unwrap();
    assert!(written.contains("sorted(xs)"));

    let state = orch.state();
    assert!(state.plan_valid);
    assert!(state.last_tool.is_none());
    assert_eq!(
        state.artifact_roles.get("sort_numbers.py").map(String::as_str),
        Some("code")
    );

    let records = memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].artifacts, vec!["sort_numbers.py"]);
    assert_eq!(records[0].summary, SORT_REFLECTION);
}

#[tokio::test]
async fn test_execute_exhaustion_is_terminal_and_not_committed() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlmClient::scripted([
        "1. Save the numbers to data.json",
        "I think we should save it",
        "Sure! Saving now.",
    ]));
    let memory = Arc::new(InMemoryLongTerm::new());
    let mut orch = build(llm.clone(), dir.path(), memory.clone());

    let err = orch.run("Persist the numbers").await.unwrap_err();
    match &err {
        EngineError::ExecuteFailed(msg) => assert!(msg.contains("EXECUTE failed after retry")),
        other => panic!("unexpected error: {other:?}"),
    }

    let state = orch.state();
    assert!(!state.plan_valid);
    assert!(state
        .last_error
        .as_deref()
        .unwrap_or_default()
        .contains("EXECUTE failed after retry"));
    assert_eq!(state.current_step_index, 0);
    // plan + 2 次执行尝试，不进入反思
    assert_eq!(llm.call_count(), 3);
    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_plan_violation_makes_single_call() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlmClient::scripted([
        "Plan:\n- Design the layout\n- Save the file",
    ]));
    let memory = Arc::new(InMemoryLongTerm::new());
    let mut orch = build(llm.clone(), dir.path(), memory.clone());

    let err = orch.run("Make a page").await.unwrap_err();
    assert!(matches!(err, EngineError::PlanViolation { ref rule, .. } if rule == "bullet_line"));
    assert_eq!(llm.call_count(), 1);
    assert!(!orch.state().plan_valid);
    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_transport_error_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlmClient::scripted_results([
        Ok("1. Save the notes to notes.txt".to_string()),
        Err(LlmError::Connection("connection refused".to_string())),
    ]));
    let mut orch = build(llm.clone(), dir.path(), Arc::new(InMemoryLongTerm::new()));

    let err = orch.run("Keep my notes").await.unwrap_err();
    assert!(matches!(err, EngineError::Llm(LlmError::Connection(_))));
    assert!(err.is_transport());
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_invalid_reflection_is_not_committed() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlmClient::scripted([
        SORT_PLAN,
        "NO_ACTION",
        SORT_WRITE,
        "Next we should add tests.",
        "It went fine.",
    ]));
    let memory = Arc::new(InMemoryLongTerm::new());
    let mut orch = build(llm.clone(), dir.path(), memory.clone());

    let err = orch.run(SORT_TASK).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidReflection(_)));
    assert_eq!(llm.call_count(), 5);
    assert!(memory.is_empty());
    // 文件已写出，但任务整体失败
    assert!(dir.path().join("sort_numbers.py").exists());
}

#[tokio::test]
async fn test_second_run_resets_state_and_sees_prior_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let mut script = sort_script();
    script.extend(sort_script());
    let llm = Arc::new(MockLlmClient::scripted(script));
    let memory = Arc::new(InMemoryLongTerm::new());
    let mut orch = build(llm.clone(), dir.path(), memory.clone());

    let first = orch.run(SORT_TASK).await.unwrap();
    let second = orch.run(SORT_TASK).await.unwrap();

    // 每次 run 从干净状态开始，结果一致
    assert_eq!(first, second);
    assert_eq!(orch.state().artifacts, vec!["sort_numbers.py"]);
    assert_eq!(memory.len(), 2);

    let calls = llm.calls();
    let first_plan = &calls[0].user;
    let second_plan = &calls[4].user;
    assert!(!first_plan.contains("PRIOR OUTCOMES"));
    assert!(second_plan.contains("PRIOR OUTCOMES"));
    assert!(second_plan.contains("sort_numbers.py"));
    // 短期对话记忆进入第二次规划的上下文
    assert!(second_plan.contains("CONTEXT"));
}

#[tokio::test]
async fn test_failed_run_leaves_nothing_for_next_task() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlmClient::scripted([
        "1. Save the numbers to data.json",
        "I think we should save it",
        "Sure! Saving now.",
        "1. Write the README.md overview",
        r##"{"tool": "write_file", "args": {"path": "README.md", "content": "# Project"}}"##,
        "Created README.md with the project overview.",
    ]));
    let memory = Arc::new(InMemoryLongTerm::new());
    let mut orch = build(llm.clone(), dir.path(), memory.clone());

    assert!(orch.run("Persist the numbers").await.is_err());
    assert!(orch.state().last_error.is_some());

    let outcome = orch.run("Document the project").await.unwrap();
    assert_eq!(outcome.artifacts, vec!["README.md"]);
    assert_eq!(outcome.steps_completed, 1);

    let state = orch.state();
    assert_eq!(state.task.as_deref(), Some("Document the project"));
    assert_eq!(state.plan, vec!["Write the README.md overview"]);
    assert!(state.plan_valid);
    assert!(state.last_error.is_none());
    assert_eq!(state.artifacts, vec!["README.md"]);

    let calls = llm.calls();
    assert_eq!(calls.len(), 6);
    // 失败的任务没有写入长期记忆
    assert!(!calls[3].user.contains("PRIOR OUTCOMES"));
    // 反思看到的状态快照只属于第二个任务
    let reflect_prompt = &calls[5].user;
    assert!(reflect_prompt.contains("TASK:\nDocument the project"));
    assert!(reflect_prompt.contains("PLAN VALID:\ntrue"));
    assert!(reflect_prompt.contains("LAST ERROR:\nNone"));
    assert!(!reflect_prompt.contains("data.json"));
    assert!(!reflect_prompt.contains("Persist the numbers"));
    assert_eq!(memory.len(), 1);
}

#[tokio::test]
async fn test_path_escape_is_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let ws = dir.path().join("ws");
    std::fs::create_dir_all(&ws).unwrap();
    let llm = Arc::new(MockLlmClient::scripted([
        "1. Save the secret to a file",
        r#"{"tool": "write_file", "args": {"path": "../escape.txt", "content": "x"}}"#,
    ]));
    let memory = Arc::new(InMemoryLongTerm::new());
    let mut orch = build(llm, &ws, memory.clone());

    let err = orch.run("Store the secret").await.unwrap_err();
    assert!(matches!(err, EngineError::ToolExecutionFailed(_)));
    assert!(!dir.path().join("escape.txt").exists());
    assert!(orch.state().artifacts.is_empty());
    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_unknown_tool_is_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlmClient::scripted([
        "1. Export the report",
        r#"{"tool": "send_email", "args": {"to": "x"}}"#,
    ]));
    let mut orch = build(llm, dir.path(), Arc::new(InMemoryLongTerm::new()));

    let err = orch.run("Share the report").await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownTool(ref t) if t == "send_email"));
}

#[tokio::test]
async fn test_default_mock_with_file_memory_persists_record() {
    let dir = tempfile::tempdir().unwrap();
    let memory_path = dir.path().join("memory").join("long_term.json");
    let memory = Arc::new(FileLongTerm::open(&memory_path).unwrap());
    let mut orch = build(Arc::new(MockLlmClient::default()), dir.path(), memory);

    let outcome = orch.run("Produce a short note").await.unwrap();
    assert_eq!(outcome.artifacts, vec!["output.txt"]);

    let reopened = FileLongTerm::open(&memory_path).unwrap();
    let recalled = reopened.recall("produce a short note");
    assert_eq!(recalled.len(), 1);
    assert_eq!(recalled[0].artifacts, vec!["output.txt"]);
}
