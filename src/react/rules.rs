//! 结构校验规则
//!
//! 每条规则有稳定的名字并可单独测试；RuleSet 按注册顺序执行，返回第一条违规。
//! 计划校验（上下文为 `()`）与反思校验（上下文为产物列表）共用同一套机制。

use std::fmt;

/// 规则违规：规则名 + 详情
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub rule: &'static str,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.detail)
    }
}

/// 单条校验规则；C 为校验所需的附加上下文
pub trait Rule<C: ?Sized>: Send + Sync {
    fn name(&self) -> &'static str;

    /// 通过返回 Ok(())，否则返回违规详情
    fn check(&self, text: &str, ctx: &C) -> Result<(), String>;
}

/// 有序规则集
pub struct RuleSet<C: ?Sized> {
    rules: Vec<Box<dyn Rule<C>>>,
}

impl<C: ?Sized> Default for RuleSet<C> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<C: ?Sized> RuleSet<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rule: impl Rule<C> + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, text: &str, ctx: &C) -> Result<(), Violation> {
        for rule in &self.rules {
            if let Err(detail) = rule.check(text, ctx) {
                return Err(Violation {
                    rule: rule.name(),
                    detail,
                });
            }
        }
        Ok(())
    }
}
