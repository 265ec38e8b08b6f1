//! Praxis HTTP 服务
//!
//! 启动: cargo run --bin praxis-api --features web
//! 监听地址取 [server].bind（环境变量 PRAXIS__SERVER__BIND 可覆盖）。

#[cfg(feature = "web")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use praxis::agent::{build_orchestrator, load_config_or_default};
    use praxis::api::{create_router, ApiState};

    praxis::observability::init();

    let cfg = load_config_or_default(None);
    let orchestrator = build_orchestrator(&cfg).context("failed to build orchestrator")?;
    let app = create_router(ApiState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("cannot bind {}", cfg.server.bind))?;
    tracing::info!("Praxis API listening on http://{}", cfg.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "web"))]
fn main() {
    eprintln!("请使用 --features web 编译: cargo run --bin praxis-api --features web");
    std::process::exit(1);
}
