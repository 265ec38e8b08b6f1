//! 沙箱文件系统工具
//!
//! SafeFs 绑定 root_dir，所有路径必须落在 root 下（禁止 ../ 逃逸、绝对路径与指向根外的符号链接）；
//! ReadFileTool / WriteFileTool 基于 SafeFs 提供 read_file / write_file 能力。

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::EngineError;
use crate::tools::Tool;

/// 沙箱文件系统：绑定根目录，校验路径在根下，防止路径逃逸
#[derive(Debug, Clone)]
pub struct SafeFs {
    root_dir: PathBuf,
}

impl SafeFs {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        let root = root_dir.as_ref().to_path_buf();
        let root_dir = root.canonicalize().unwrap_or(root);
        Self { root_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// 词法归一化：去掉 `.`，`..` 回退一级；越过根或出现绝对路径即视为逃逸
    fn normalize(&self, path: &str) -> Result<PathBuf, EngineError> {
        let mut out = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !out.pop() {
                        return Err(EngineError::PathEscape(path.to_string()));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(EngineError::PathEscape(path.to_string()));
                }
            }
        }
        if out.as_os_str().is_empty() {
            return Err(EngineError::ToolExecutionFailed(format!(
                "Invalid path: '{}'",
                path
            )));
        }
        Ok(self.root_dir.join(out))
    }

    /// 解析已存在的文件，并确认真实路径（跟随符号链接）仍在根下
    pub fn resolve(&self, path: &str) -> Result<PathBuf, EngineError> {
        let full = self.normalize(path)?;
        let canonical = full
            .canonicalize()
            .map_err(|_| EngineError::ToolExecutionFailed(format!("Path not found: {}", path)))?;
        if canonical.starts_with(&self.root_dir) {
            Ok(canonical)
        } else {
            Err(EngineError::PathEscape(path.to_string()))
        }
    }

    pub fn read_file(&self, path: &str) -> Result<String, EngineError> {
        let resolved = self.resolve(path)?;
        std::fs::read_to_string(&resolved)
            .map_err(|e| EngineError::ToolExecutionFailed(format!("Read failed: {}", e)))
    }

    /// 真实路径须在根下
    fn ensure_within_root(&self, dir: &Path, path: &str) -> Result<(), EngineError> {
        let canonical = dir.canonicalize().map_err(|e| {
            EngineError::ToolExecutionFailed(format!("Failed to resolve {}: {}", dir.display(), e))
        })?;
        if canonical.starts_with(&self.root_dir) {
            Ok(())
        } else {
            Err(EngineError::PathEscape(path.to_string()))
        }
    }

    /// 写入（覆盖）文件，自动创建父目录
    ///
    /// 创建目录前先校验最深的已存在祖先，创建后再校验父目录；目标本身是符号链接时拒绝。
    pub fn write_file(&self, path: &str, content: &str) -> Result<PathBuf, EngineError> {
        let target = self.normalize(path)?;
        if let Some(parent) = target.parent() {
            if let Some(existing) = parent.ancestors().find(|p| p.exists()) {
                self.ensure_within_root(existing, path)?;
            }
            std::fs::create_dir_all(parent).map_err(|e| {
                EngineError::ToolExecutionFailed(format!("Failed to create parent directory: {}", e))
            })?;
            self.ensure_within_root(parent, path)?;
        }
        if std::fs::symlink_metadata(&target)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
        {
            return Err(EngineError::PathEscape(path.to_string()));
        }
        std::fs::write(&target, content)
            .map_err(|e| EngineError::ToolExecutionFailed(format!("Write failed: {}", e)))?;
        Ok(target)
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing required parameter: {}", key))
}

/// read_file 工具：读取文件内容
pub struct ReadFileTool {
    fs: SafeFs,
}

impl ReadFileTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file given a path. Args: {\"path\": \"file path relative to workspace\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = required_str(&args, "path")?;
        tracing::info!(path = %path, "read_file tool execute");
        self.fs.read_file(path).map_err(|e| e.to_string())
    }
}

/// write_file 工具：写入文件内容
pub struct WriteFileTool {
    fs: SafeFs,
}

impl WriteFileTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file at a given path. Args: {\"path\": \"file path relative to workspace\", \"content\": \"file content\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = required_str(&args, "path")?;
        let content = required_str(&args, "content")?;
        tracing::info!(path = %path, bytes = content.len(), "write_file tool execute");
        self.fs
            .write_file(path, content)
            .map(|_| "File written successfully".to_string())
            .map_err(|e| e.to_string())
    }
}
