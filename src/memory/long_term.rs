//! 长期记忆：跨任务的成功记录，规划时检索、反思通过后追加
//!
//! 每条记录含 task_signature（小写、去首尾空白的任务文本）、产物列表与反思摘要。
//! recall 采用双向子串匹配（记录签名包含查询，或查询包含签名），大小写不敏感。
//! FileLongTerm 每次写入都把整个数组序列化回 JSON 文件；InMemoryLongTerm 供测试与无盘场景使用。

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("memory io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("memory file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("memory store lock poisoned")]
    Poisoned,
}

/// 一条长期记忆记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_signature: String,
    pub artifacts: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

impl TaskRecord {
    pub fn new(task: &str, artifacts: &[String], summary: &str) -> Self {
        Self {
            task_signature: task_signature(task),
            artifacts: artifacts.to_vec(),
            summary: summary.to_string(),
            recorded_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// 签名与查询是否互为子串
    pub fn matches(&self, query: &str) -> bool {
        let query = task_signature(query);
        if query.is_empty() || self.task_signature.is_empty() {
            return false;
        }
        query.contains(&self.task_signature) || self.task_signature.contains(&query)
    }
}

/// 任务签名：去首尾空白并转小写
pub fn task_signature(task: &str) -> String {
    task.trim().to_lowercase()
}

/// 长期记忆 trait：检索与追加
pub trait LongTermMemory: Send + Sync {
    /// 按插入顺序返回所有匹配记录
    fn recall(&self, task: &str) -> Vec<TaskRecord>;

    /// 追加一条记录并持久化
    fn store(&self, task: &str, artifacts: &[String], summary: &str) -> Result<(), MemoryError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 内存实现：进程结束即丢失
#[derive(Debug, Default)]
pub struct InMemoryLongTerm {
    records: RwLock<Vec<TaskRecord>>,
}

impl InMemoryLongTerm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TaskRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

impl LongTermMemory for InMemoryLongTerm {
    fn recall(&self, task: &str) -> Vec<TaskRecord> {
        match self.records.read() {
            Ok(records) => records.iter().filter(|r| r.matches(task)).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn store(&self, task: &str, artifacts: &[String], summary: &str) -> Result<(), MemoryError> {
        let mut records = self.records.write().map_err(|_| MemoryError::Poisoned)?;
        records.push(TaskRecord::new(task, artifacts, summary));
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }
}

/// 文件实现：JSON 数组，启动时加载，每次 store 全量写回
#[derive(Debug)]
pub struct FileLongTerm {
    path: PathBuf,
    records: RwLock<Vec<TaskRecord>>,
}

impl FileLongTerm {
    /// 打开记忆文件；文件不存在时从空开始（首次写入时创建）
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref().to_path_buf();
        let records = match std::fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => Vec::new(),
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), count = records.len(), "long-term memory loaded");
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &[TaskRecord]) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(records)?)?;
        Ok(())
    }
}

impl LongTermMemory for FileLongTerm {
    fn recall(&self, task: &str) -> Vec<TaskRecord> {
        match self.records.read() {
            Ok(records) => records.iter().filter(|r| r.matches(task)).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn store(&self, task: &str, artifacts: &[String], summary: &str) -> Result<(), MemoryError> {
        let mut records = self.records.write().map_err(|_| MemoryError::Poisoned)?;
        records.push(TaskRecord::new(task, artifacts, summary));
        if let Err(e) = self.persist(&records) {
            records.pop();
            return Err(e);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }
}
