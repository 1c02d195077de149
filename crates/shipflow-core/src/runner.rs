//! バッチ実行ループ
//!
//! 順序付けされたユニットを1つずつ タグ付け → ビルド → ローカルタグ → プッシュ する。
//! 1ユニットの失敗はバッチ全体を止めない。

use crate::engine::{EngineResult, ImageEngine};
use crate::model::{BuildStatus, BuildUnit, PushStatus};
use crate::plan::BatchPlan;
use crate::report::{
    BatchSummary, FailureKind, ProgressLine, Reporter, Step, UnitFailure, should_report,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// 実行ループの設定
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// プッシュ先レジストリ（フラットタグのリポジトリ部分）
    pub registry: String,
    /// VERSION ラベルがないユニットに使うバージョン
    pub default_version: String,
    /// false の場合、すべてのプッシュを skipped とする
    pub push_enabled: bool,
}

impl RunOptions {
    pub fn new(registry: impl Into<String>, default_version: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            default_version: default_version.into(),
            push_enabled: true,
        }
    }
}

/// フラットなビルドタグ: `{registry}:{image_name}-{version}`
pub fn flat_build_tag(registry: &str, unit: &BuildUnit, default_version: &str) -> String {
    format!(
        "{}:{}-{}",
        registry,
        unit.image_name.as_deref().unwrap_or("image"),
        unit.resolved_version(default_version)
    )
}

pub struct BatchRunner<'a, E, R> {
    engine: &'a E,
    reporter: R,
    options: RunOptions,
}

impl<'a, E: ImageEngine, R: Reporter> BatchRunner<'a, E, R> {
    pub fn new(engine: &'a E, reporter: R, options: RunOptions) -> Self {
        Self {
            engine,
            reporter,
            options,
        }
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// プラン内の全ユニットを順に処理し、結果を集計する
    pub async fn run(&mut self, plan: &mut BatchPlan) -> BatchSummary {
        let total = plan.len();
        let start = Instant::now();
        let order = plan.order().to_vec();

        self.reporter.start(total);
        info!(total, registry = %self.options.registry, "Starting batch");

        let mut built = 0;
        let mut pushed = 0;
        let mut push_skipped = 0;
        let mut failures = Vec::new();

        for (position, id) in order.into_iter().enumerate() {
            let index = position + 1;
            let unit = plan.unit_mut(id);
            let declared = unit.declared_tag(&self.options.default_version);

            if let Err(e) = self.process(unit, &declared).await {
                error!(unit = %declared, error = %e, "Unit processing aborted");
                failures.push(UnitFailure {
                    unit: declared.clone(),
                    kind: FailureKind::Aborted,
                    message: e.to_string(),
                });
            }

            match unit.build_status {
                status if status.is_success() => built += 1,
                BuildStatus::Failed => failures.push(UnitFailure {
                    unit: declared.clone(),
                    kind: FailureKind::Build,
                    message: unit
                        .build_issue
                        .as_ref()
                        .map(|i| i.message.clone())
                        .unwrap_or_else(|| "build failed".to_string()),
                }),
                _ => {}
            }

            match unit.push_status {
                PushStatus::Pushed => pushed += 1,
                PushStatus::Skipped => push_skipped += 1,
                PushStatus::Failed => failures.push(UnitFailure {
                    unit: declared.clone(),
                    kind: FailureKind::Push,
                    message: unit
                        .push_issue
                        .as_ref()
                        .map(|i| i.message.clone())
                        .unwrap_or_else(|| "push failed".to_string()),
                }),
                PushStatus::Unstarted => {}
            }

            if should_report(index, total) {
                self.reporter.progress(&ProgressLine {
                    index,
                    total,
                    built,
                    pushed,
                    elapsed: start.elapsed(),
                });
            }
        }

        let summary = BatchSummary {
            total,
            built,
            pushed,
            push_skipped,
            elapsed: start.elapsed(),
            registry: self.options.registry.clone(),
            failures,
        };
        self.reporter.summary(&summary);
        summary
    }

    /// 1ユニットの処理
    ///
    /// ここで返るエラーはユニット単位で捕捉され、次のユニットに進む。
    async fn process(&mut self, unit: &mut BuildUnit, declared: &str) -> EngineResult<()> {
        let build_tag = flat_build_tag(
            &self.options.registry,
            unit,
            &self.options.default_version,
        );
        unit.assign_build_tag(build_tag.clone())?;
        debug!(unit = %declared, build_tag = %build_tag, "Assigned build tag");

        if let Some(issue) = self.engine.precheck(unit).await? {
            warn!(unit = %declared, issue = %issue, "Pre-build check reported an issue");
        }

        let outcome = self.engine.build(unit).await?;
        unit.build_status = outcome.status;
        unit.build_issue = outcome.issue;
        info!(
            unit = %declared,
            status = %unit.build_status,
            duration_secs = outcome.duration.as_secs(),
            "Build finished"
        );

        if !unit.build_status.is_success()
            && let Some(output) = unit.build_issue.as_ref().and_then(|i| i.output.as_ref())
        {
            self.reporter.output_tail(Step::Build, declared, output);
        }

        if unit.is_local_only() {
            if unit.build_status.is_success()
                && let Err(e) = self.engine.tag(&build_tag, declared).await
            {
                warn!(unit = %declared, error = %e, "Failed to tag local-only image");
            }
            unit.push_status = PushStatus::Skipped;
            return Ok(());
        }

        if !self.options.push_enabled {
            unit.push_status = PushStatus::Skipped;
            return Ok(());
        }

        unit.local_image = false;
        let outcome = self.engine.push(unit).await?;
        unit.push_status = outcome.status;
        unit.push_issue = outcome.issue;
        info!(
            unit = %declared,
            status = %unit.push_status,
            duration_secs = outcome.duration.as_secs(),
            "Push finished"
        );

        if unit.push_status != PushStatus::Pushed
            && let Some(output) = unit.push_issue.as_ref().and_then(|i| i.output.as_ref())
        {
            self.reporter.output_tail(Step::Push, declared, output);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LOCAL_ONLY;

    #[test]
    fn test_flat_build_tag() {
        let unit = BuildUnit::new("api/Dockerfile", "ghcr.io/org").with_image_name("api");
        assert_eq!(
            flat_build_tag("docker.io/acme/dist", &unit, "0.5.1"),
            "docker.io/acme/dist:api-0.5.1"
        );

        let unit = unit.with_version("2.0.0");
        assert_eq!(
            flat_build_tag("docker.io/acme/dist", &unit, "0.5.1"),
            "docker.io/acme/dist:api-2.0.0"
        );
    }

    #[test]
    fn test_flat_build_tag_without_image_name() {
        let unit = BuildUnit::new("x/Dockerfile", LOCAL_ONLY);
        assert_eq!(flat_build_tag("reg", &unit, "1"), "reg:image-1");
    }
}
