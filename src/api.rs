//! HTTP 接口（feature = "web"）
//!
//! POST /run 提交任务，成功返回 TaskOutcome，终止性失败返回 400 与 {"detail": ...}；
//! GET /health 存活探针。Orchestrator 持有单任务状态，请求通过 Mutex 串行执行。

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::{Orchestrator, TaskOutcome};

pub struct ApiState {
    pub orchestrator: Mutex<Orchestrator>,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator) -> Arc<Self> {
        Arc::new(Self {
            orchestrator: Mutex::new(orchestrator),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub task: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/run", post(run_task))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

async fn run_task(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<TaskOutcome>, (StatusCode, Json<ErrorBody>)> {
    let mut orchestrator = state.orchestrator.lock().await;
    match orchestrator.run(&req.task).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            tracing::warn!(error = %e, "task failed");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    detail: e.to_string(),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::core::EngineSettings;
    use crate::llm::MockLlmClient;
    use crate::memory::InMemoryLongTerm;
    use crate::tools::{ToolExecutor, ToolRegistry};

    fn app(llm: MockLlmClient, workspace: &std::path::Path) -> Router {
        let orch = Orchestrator::new(
            Arc::new(llm),
            ToolExecutor::new(ToolRegistry::with_file_tools(workspace), 5),
            Arc::new(InMemoryLongTerm::new()),
            EngineSettings::default(),
        );
        create_router(ApiState::new(orch))
    }

    fn run_request(task: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/run")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "task": task }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_returns_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(MockLlmClient::default(), dir.path())
            .oneshot(run_request("Produce a short note"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let outcome: TaskOutcome = serde_json::from_slice(&body).unwrap();
        assert_eq!(outcome.total_steps, 2);
        assert_eq!(outcome.steps_completed, 2);
        assert_eq!(outcome.artifacts, vec!["output.txt"]);
    }

    #[tokio::test]
    async fn test_plan_violation_maps_to_400() {
        let dir = tempfile::tempdir().unwrap();
        let llm = MockLlmClient::scripted(["1. Write print('x') to a file"]);
        let resp = app(llm, dir.path())
            .oneshot(run_request("Say hello"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert!(err.detail.contains("forbidden_code_token"));
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(MockLlmClient::default(), dir.path())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
