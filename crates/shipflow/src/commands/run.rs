use crate::docker;
use colored::Colorize;
use shipflow_build::{DockerEngine, EngineOptions};
use shipflow_config::RunConfig;
use shipflow_core::{BatchRunner, ConsoleReporter, FailureKind, RunOptions};

/// バッチを実行する
///
/// 失敗したユニットがあればエラーを返す（`allow_failures` のときは常に成功）。
pub async fn handle(config: &RunConfig, allow_failures: bool) -> anyhow::Result<()> {
    let mut plan = super::resolve_plan(config)?;

    let docker = docker::connect().await?;
    let engine = DockerEngine::new(
        docker,
        EngineOptions {
            skip_push_no_changes: config.skip_push_no_changes,
            no_cache: config.no_cache,
        },
    );

    let mut options = RunOptions::new(&config.default_registry, &config.build_version);
    options.push_enabled = config.push_enabled;

    let mut runner = BatchRunner::new(&engine, ConsoleReporter, options);
    let summary = runner.run(&mut plan).await;

    if summary.is_success() {
        return Ok(());
    }

    let failed = summary.failed_units();
    if allow_failures {
        println!(
            "{} {} unit(s) failed (ignored by --allow-failures)",
            "[shipflow]".blue(),
            failed
        );
        return Ok(());
    }

    anyhow::bail!(
        "{} unit(s) failed: build={} push={} aborted={}",
        failed,
        summary.count(FailureKind::Build),
        summary.count(FailureKind::Push),
        summary.count(FailureKind::Aborted)
    )
}
