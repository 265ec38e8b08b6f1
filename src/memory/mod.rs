//! 记忆层：短期（对话上下文）与长期（跨任务成功记录）

pub mod conversation;
pub mod long_term;

pub use conversation::{ConversationMemory, Message, Role};
pub use long_term::{
    task_signature, FileLongTerm, InMemoryLongTerm, LongTermMemory, MemoryError, TaskRecord,
};
