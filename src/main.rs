//! Praxis 命令行：逐行读取任务并运行 计划 → 执行 → 反思
//!
//! 用法: praxis [config.toml]；输入 exit / quit 或 EOF 退出。

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use praxis::agent::{build_orchestrator, load_config_or_default};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    praxis::observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config_or_default(config_path);
    let mut orchestrator = build_orchestrator(&cfg).context("failed to build orchestrator")?;

    println!("Praxis ready. Workspace: {}", cfg.workspace().display());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        match orchestrator.run(input).await {
            Ok(outcome) => {
                if let Some(reflection) = &outcome.reflection {
                    println!("{reflection}");
                }
                let (_, _, tokens) = orchestrator.token_usage();
                println!(
                    "[{}/{} steps] artifacts: {} (tokens so far: {})",
                    outcome.steps_completed,
                    outcome.total_steps,
                    outcome.artifacts.join(", "),
                    tokens
                );
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
