//! Docker デーモンによる `ImageEngine` 実装

use crate::builder::ImageBuilder;
use crate::context::ContextBuilder;
use crate::error::{BuildError, BuildResult};
use crate::pusher::{ImagePusher, split_image_tag};
use bollard::Docker;
use shipflow_core::{
    BuildOutcome, BuildStatus, BuildUnit, EngineResult, ImageEngine, Issue, PushOutcome,
    PushStatus,
};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// ビルドでイメージ ID が変わらなかった場合はプッシュしない
    pub skip_push_no_changes: bool,
    pub no_cache: bool,
}

pub struct DockerEngine {
    builder: ImageBuilder,
    pusher: ImagePusher,
    options: EngineOptions,
}

impl DockerEngine {
    pub fn new(docker: Docker, options: EngineOptions) -> Self {
        Self {
            builder: ImageBuilder::new(docker.clone()),
            pusher: ImagePusher::new(docker),
            options,
        }
    }
}

fn require_build_tag(unit: &BuildUnit) -> BuildResult<&str> {
    unit.build_tag().ok_or_else(|| BuildError::InvalidTag {
        tag: format!("(not assigned for {})", unit),
    })
}

/// 失敗を `Issue` に変換する。想定外のエラーはそのまま返す。
fn into_issue(error: BuildError) -> BuildResult<Issue> {
    match error {
        BuildError::BuildFailed { message, output } | BuildError::PushFailed { message, output } => {
            Ok(Issue::new(message).with_output(output))
        }
        e @ (BuildError::InvalidTag { .. } | BuildError::AuthFailed { .. }) => {
            Ok(Issue::new(e.to_string()))
        }
        e => Err(e),
    }
}

impl ImageEngine for DockerEngine {
    async fn precheck(&self, unit: &BuildUnit) -> EngineResult<Option<Issue>> {
        if !unit.path.is_file() {
            return Ok(Some(Issue::new(format!(
                "Dockerfile not found: {}",
                unit.path.display()
            ))));
        }

        let mut missing = Vec::new();
        for base in unit.base_images.iter().filter(|b| b.is_local_only()) {
            if !self.builder.image_exists(&base.tag).await? {
                missing.push(base.tag.as_str());
            }
        }

        if missing.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Issue::new(format!(
                "local-only base image not found: {}",
                missing.join(", ")
            ))))
        }
    }

    async fn build(&self, unit: &BuildUnit) -> EngineResult<BuildOutcome> {
        let started = Instant::now();
        let tag = require_build_tag(unit)?;
        let context = ContextBuilder::for_unit(unit)?;

        let previous_id = self.builder.image_id(tag).await?;

        match self
            .builder
            .build_image(context, tag, self.options.no_cache)
            .await
        {
            Ok(_) => {
                let current_id = self.builder.image_id(tag).await?;
                let status = if previous_id.is_some() && previous_id == current_id {
                    BuildStatus::NothingChanged
                } else {
                    BuildStatus::Built
                };
                Ok(BuildOutcome::new(status, started.elapsed()))
            }
            Err(e) => Ok(BuildOutcome::failed(into_issue(e)?, started.elapsed())),
        }
    }

    async fn tag(&self, source: &str, target: &str) -> EngineResult<()> {
        Ok(self.builder.tag_image(source, target).await?)
    }

    async fn push(&self, unit: &BuildUnit) -> EngineResult<PushOutcome> {
        let started = Instant::now();

        if unit.local_image || unit.is_local_only() {
            tracing::warn!(unit = %unit, "Refusing to push local-only image");
            return Ok(PushOutcome::new(PushStatus::Skipped, started.elapsed()));
        }

        if self.options.skip_push_no_changes && unit.build_status == BuildStatus::NothingChanged {
            tracing::info!(unit = %unit, "Image unchanged, skipping push");
            return Ok(PushOutcome::new(PushStatus::Skipped, started.elapsed()));
        }

        let (image, tag) = split_image_tag(require_build_tag(unit)?);
        match self.pusher.push(&image, &tag).await {
            Ok(_) => Ok(PushOutcome::new(PushStatus::Pushed, started.elapsed())),
            Err(e) => Ok(PushOutcome::failed(into_issue(e)?, started.elapsed())),
        }
    }
}
