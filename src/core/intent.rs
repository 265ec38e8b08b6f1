//! 产物意图推断：根据任务与步骤文本推测下一步应产出的文件
//!
//! 只影响 TaskState 中的 expected_artifact，从不发起工具调用。

use crate::core::ArtifactIntent;

const PERSIST_KEYWORDS: &[&str] = &["save", "write", "export", "persist"];
const CODE_TASK_KEYWORDS: &[&str] = &["python", "function", "script", "program"];
const CODE_STEP_KEYWORDS: &[&str] = &["implement", "generate", "create", "define", "code"];
const DOC_TASK_KEYWORDS: &[&str] = &["readme", "documentation", "doc"];

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// 按优先级推断：持久化步骤 > 代码任务 > 文档任务；均不命中返回 None
pub fn infer_artifact_intent(task: &str, step: &str) -> Option<ArtifactIntent> {
    let task = task.to_lowercase();
    let step = step.to_lowercase();

    if mentions_any(&step, PERSIST_KEYWORDS) {
        let name = if step.contains("csv") {
            "output.csv"
        } else if step.contains("json") {
            "output.json"
        } else {
            "output.txt"
        };
        return Some(ArtifactIntent::new(name, "data"));
    }

    if mentions_any(&task, CODE_TASK_KEYWORDS) && mentions_any(&step, CODE_STEP_KEYWORDS) {
        return Some(ArtifactIntent::new("main.py", "code"));
    }

    if mentions_any(&task, DOC_TASK_KEYWORDS) {
        return Some(ArtifactIntent::new("README.md", "doc"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_task_implement_step_infers_main_py() {
        let intent = infer_artifact_intent(
            "Write a Python function to sort a list",
            "Implement the sorting function",
        );
        assert_eq!(intent, Some(ArtifactIntent::new("main.py", "code")));
    }

    #[test]
    fn test_save_step_infers_data_file_by_format() {
        let task = "Write a Python function to sort a list";
        assert_eq!(
            infer_artifact_intent(task, "Save the result to a CSV"),
            Some(ArtifactIntent::new("output.csv", "data"))
        );
        assert_eq!(
            infer_artifact_intent(task, "Export the records as JSON"),
            Some(ArtifactIntent::new("output.json", "data"))
        );
        assert_eq!(
            infer_artifact_intent(task, "Persist the summary"),
            Some(ArtifactIntent::new("output.txt", "data"))
        );
    }

    #[test]
    fn test_doc_task_infers_readme() {
        assert_eq!(
            infer_artifact_intent("Draft the README for this repo", "Outline the sections"),
            Some(ArtifactIntent::new("README.md", "doc"))
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        assert_eq!(infer_artifact_intent("Sort numbers", "Frobnicate the widget"), None);
    }

    #[test]
    fn test_inference_is_deterministic() {
        let a = infer_artifact_intent("python script", "Generate the code");
        let b = infer_artifact_intent("python script", "Generate the code");
        assert_eq!(a, b);
    }
}
