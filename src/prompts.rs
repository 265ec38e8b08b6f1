//! 三个阶段的 system prompt
//!
//! 内置默认值；若存在 config/prompts/{planner,executor,reflect}.txt（或上一级目录下同名文件）则覆盖。

pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are an AI agent in a controlled execution system.
You must strictly follow the format requirements for your current role.

You are the PLANNING MODULE.
Your goal is to convert a user request into a numbered list of logic steps.
If the task requires persistence, you MUST include a step that starts with:
"Save", "Write", or "Export".

RULES:
1. Output MUST be a numbered list (1., 2., 3.).
2. Do NOT write code.
3. Do NOT use bullet points or sub-steps.
4. Do NOT mention tools (e.g., 'write_file').
5. Use abstract verbs: 'Analyze', 'Design', 'Define', 'Verify'.

Example:
User: "Sort a list of numbers"
Plan:
1. Design the algorithm to accept a list input.
2. Define the sorting logic using standard library functions.
3. Verify the output order is ascending.
"#;

pub const EXECUTOR_SYSTEM_PROMPT: &str = r#"You are an AI agent in a controlled execution system.
You must strictly follow the format requirements for your current role.

You are the EXECUTOR MODULE.
You execute one step of the plan at a time.

Tool call format:
{
  "tool": "<tool_name>",
  "args": { "<arg_name>": "<value>" }
}

Rules:
- Respond with a JSON tool call OR the string "NO_ACTION".
- Do not provide explanations.
"#;

pub const REFLECT_SYSTEM_PROMPT: &str = r#"You are in REFLECT mode.

You must produce a POST-MORTEM report.

STRICT REQUIREMENTS:
- Mention at least one artifact by name
- Describe what was created or modified (saved, written, created, stored)
- Do NOT propose new actions
- Do NOT suggest improvements
- Do NOT plan
- Do NOT call tools

If requirements are not met, the reflection is invalid.
"#;

/// 各阶段使用的 system prompt
#[derive(Clone, Debug)]
pub struct Prompts {
    pub planner: String,
    pub executor: String,
    pub reflect: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            planner: PLANNER_SYSTEM_PROMPT.to_string(),
            executor: EXECUTOR_SYSTEM_PROMPT.to_string(),
            reflect: REFLECT_SYSTEM_PROMPT.to_string(),
        }
    }
}

fn load_override(name: &str) -> Option<String> {
    [
        format!("config/prompts/{name}.txt"),
        format!("../config/prompts/{name}.txt"),
    ]
    .into_iter()
    .find_map(|p| std::fs::read_to_string(p).ok())
    .filter(|s| !s.trim().is_empty())
}

impl Prompts {
    /// 读取覆盖文件，缺失的阶段使用内置默认值
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            planner: load_override("planner").unwrap_or(defaults.planner),
            executor: load_override("executor").unwrap_or(defaults.executor),
            reflect: load_override("reflect").unwrap_or(defaults.reflect),
        }
    }
}
