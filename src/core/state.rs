//! 任务状态：当前任务、计划、游标、产物记录与有效性标记
//!
//! 每个 Orchestrator 持有一份 TaskState，在每次 run 开始时 reset（不重建）；
//! 各阶段函数以 `&mut TaskState` 显式接收并推进状态。

use std::collections::HashMap;

/// 产物意图：下一次工具结果应当产出的文件名与角色
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactIntent {
    pub name: String,
    pub role: String,
}

impl ArtifactIntent {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// 单个任务的可变状态
#[derive(Clone, Debug)]
pub struct TaskState {
    pub task: Option<String>,
    pub plan: Vec<String>,
    pub current_step_index: usize,
    pub plan_valid: bool,
    pub expected_artifact: Option<ArtifactIntent>,
    /// 产物名，按首次记录顺序
    pub artifacts: Vec<String>,
    pub artifact_roles: HashMap<String, String>,
    pub last_error: Option<String>,
    pub last_tool: Option<String>,
}

impl Default for TaskState {
    fn default() -> Self {
        Self {
            task: None,
            plan: Vec::new(),
            current_step_index: 0,
            plan_valid: true,
            expected_artifact: None,
            artifacts: Vec::new(),
            artifact_roles: HashMap::new(),
            last_error: None,
            last_tool: None,
        }
    }
}

impl TaskState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置新任务并清空上一任务的计划、产物与诊断信息
    pub fn reset(&mut self, task: &str) {
        self.task = Some(task.to_string());
        self.plan.clear();
        self.current_step_index = 0;
        self.plan_valid = true;
        self.expected_artifact = None;
        self.artifacts.clear();
        self.artifact_roles.clear();
        self.last_error = None;
        self.last_tool = None;
    }

    pub fn set_plan(&mut self, steps: Vec<String>) {
        self.plan = steps;
        self.current_step_index = 0;
        self.plan_valid = true;
    }

    /// 当前步骤；计划无效或游标越过末尾时为 None
    pub fn current_step(&self) -> Option<&str> {
        if !self.plan_valid {
            return None;
        }
        self.plan.get(self.current_step_index).map(String::as_str)
    }

    /// 游标前进一步，不超过 plan.len()
    pub fn advance_step(&mut self) {
        if self.current_step_index < self.plan.len() {
            self.current_step_index += 1;
        }
    }

    pub fn invalidate_plan(&mut self, reason: impl Into<String>) {
        self.plan_valid = false;
        self.last_error = Some(reason.into());
    }

    pub fn is_complete(&self) -> bool {
        self.plan_valid && self.current_step_index >= self.plan.len()
    }

    pub fn set_expected_artifact(&mut self, intent: ArtifactIntent) {
        self.expected_artifact = Some(intent);
    }

    pub fn has_artifact_intent(&self) -> bool {
        self.expected_artifact.is_some()
    }

    /// 当前意图的角色，无意图时为 "unknown"
    pub fn intent_role(&self) -> String {
        self.expected_artifact
            .as_ref()
            .map(|i| i.role.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// 记录产物；名字与意图一致时视为兑现并清除意图
    pub fn add_artifact(&mut self, name: &str, role: &str) {
        if !self.artifacts.iter().any(|a| a == name) {
            self.artifacts.push(name.to_string());
        }
        self.artifact_roles.insert(name.to_string(), role.to_string());

        if self
            .expected_artifact
            .as_ref()
            .is_some_and(|i| i.name == name)
        {
            self.expected_artifact = None;
        }
    }

    pub fn record_tool(&mut self, tool: &str) {
        self.last_tool = Some(tool.to_string());
    }

    pub fn clear_last_tool(&mut self) {
        self.last_tool = None;
    }

    /// 文本快照，拼入反思阶段 prompt
    pub fn summary(&self) -> String {
        let plan_info = if self.plan.is_empty() {
            "None".to_string()
        } else {
            self.plan
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {}", i + 1, s))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let artifact_info = if self.artifacts.is_empty() {
            "None".to_string()
        } else {
            self.artifacts
                .iter()
                .map(|name| {
                    let role = self
                        .artifact_roles
                        .get(name)
                        .map(String::as_str)
                        .unwrap_or("unknown");
                    format!("- {}: {}", name, role)
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let expected = match &self.expected_artifact {
            Some(i) => format!("{} ({})", i.name, i.role),
            None => "None (None)".to_string(),
        };

        format!(
            "TASK:\n{}\n\nPLAN VALID:\n{}\n\nCURRENT STEP:\n{}\n\nEXPECTED ARTIFACT:\n{}\n\nPLAN:\n{}\n\nARTIFACTS:\n{}\n\nLAST ERROR:\n{}\n",
            self.task.as_deref().unwrap_or("None"),
            self.plan_valid,
            self.current_step().unwrap_or("None"),
            expected,
            plan_info,
            artifact_info,
            self.last_error.as_deref().unwrap_or("None"),
        )
    }
}
