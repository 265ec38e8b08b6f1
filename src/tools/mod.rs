//! 工具层：固定的文件工具（read_file / write_file）、注册表与带超时的执行器

pub mod executor;
pub mod filesystem;
pub mod registry;
pub mod schema;

pub use executor::ToolExecutor;
pub use filesystem::{ReadFileTool, SafeFs, WriteFileTool};
pub use registry::{Tool, ToolRegistry};
pub use schema::tool_call_schema_json;
