//! 认知层：计划（Planner）、执行（StepExecutor）、反思（Critic）三个阶段与共用的校验规则

pub mod critic;
pub mod executor;
pub mod planner;
pub mod rules;

pub use critic::{reflection_rules, validate_reflection, Critic};
pub use executor::{parse_execution_output, ExecutionDecision, StepExecutor, ToolCall, NO_ACTION};
pub use planner::{parse_plan, plan_rules, planning_hint, validate_plan, Planner};
pub use rules::{Rule, RuleSet, Violation};
