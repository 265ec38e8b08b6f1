//! 步骤分类器：判断计划步骤是否需要触发工具
//!
//! 纯函数，按动词前缀匹配；先查不可执行动词，再查可执行动词，均未命中时保守地视为不可执行。

/// 步骤类别
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Executable,
    NonExecutable,
}

/// 抽象动词：只做思考，不触发工具
const NON_EXECUTABLE_VERBS: &[&str] = &[
    "analyze",
    "design",
    "define",
    "identify",
    "determine",
    "verify",
    "validate",
    "compare",
    "evaluate",
    "plan",
    "understand",
];

/// 产出型动词：需要进入执行阶段
const EXECUTABLE_VERBS: &[&str] = &[
    "save",
    "write",
    "export",
    "persist",
    "store",
    "implement",
];

pub fn classify_step(step: &str) -> StepKind {
    let lower = step.trim().to_lowercase();

    if NON_EXECUTABLE_VERBS.iter().any(|v| lower.starts_with(v)) {
        return StepKind::NonExecutable;
    }
    if EXECUTABLE_VERBS.iter().any(|v| lower.starts_with(v)) {
        return StepKind::Executable;
    }
    StepKind::NonExecutable
}
