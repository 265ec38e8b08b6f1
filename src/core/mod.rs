//! 核心层：任务状态、步骤分类、产物意图、重试原语与主编排器

pub mod classifier;
pub mod error;
pub mod intent;
pub mod orchestrator;
pub mod retry;
pub mod state;

pub use classifier::{classify_step, StepKind};
pub use error::EngineError;
pub use intent::infer_artifact_intent;
pub use orchestrator::{EngineSettings, Orchestrator, TaskOutcome};
pub use retry::{generate_validated, GenerationError};
pub use state::{ArtifactIntent, TaskState};
