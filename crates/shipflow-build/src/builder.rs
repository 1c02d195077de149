use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bollard::models::BuildInfo;
use bytes::Bytes;
use futures_util::stream::StreamExt;
use http_body_util::{Either, Full};
use shipflow_core::ProcessOutput;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルドし、デーモンの出力を返す
    ///
    /// 失敗時は `BuildError::BuildFailed` に途中までの出力が入る。
    pub async fn build_image(
        &self,
        context: BuildContext,
        tag: &str,
        no_cache: bool,
    ) -> BuildResult<ProcessOutput> {
        tracing::info!(tag, "Building image");

        // local-only のベースイメージはレジストリに存在しないため pull しない
        #[allow(deprecated)]
        let options = bollard::image::BuildImageOptions {
            dockerfile: context.dockerfile.as_str(),
            t: tag,
            nocache: no_cache,
            rm: true,
            forcerm: true,
            pull: false,
            ..Default::default()
        };

        let body = Full::new(Bytes::from(context.archive));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        let mut output = ProcessOutput::default();
        while let Some(msg) = stream.next().await {
            let info = match msg {
                Ok(info) => info,
                Err(e) => {
                    output.stderr.push_str(&format!("{}\n", e));
                    return Err(BuildError::BuildFailed {
                        message: e.to_string(),
                        output,
                    });
                }
            };

            if let Some(message) = collect_build_info(info, &mut output) {
                return Err(BuildError::BuildFailed { message, output });
            }
        }

        tracing::info!(tag, "Successfully built");
        Ok(output)
    }

    /// ローカルストア内のイメージ ID（存在しなければ None）
    pub async fn image_id(&self, image: &str) -> BuildResult<Option<String>> {
        match self.docker.inspect_image(image).await {
            Ok(inspect) => Ok(inspect.id),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(None),
            Err(e) => Err(BuildError::DockerConnection(e)),
        }
    }

    pub async fn image_exists(&self, image: &str) -> BuildResult<bool> {
        Ok(self.image_id(image).await?.is_some())
    }

    /// `source` に `target` という別名を付ける
    pub async fn tag_image(&self, source: &str, target: &str) -> BuildResult<()> {
        let (repo, tag) = crate::pusher::split_image_tag(target);

        #[allow(deprecated)]
        let options = bollard::image::TagImageOptions { repo, tag };

        self.docker.tag_image(source, Some(options)).await?;
        tracing::debug!(source, target, "Tagged image");
        Ok(())
    }
}

/// ビルド出力を蓄積し、エラーがあればそのメッセージを返す
fn collect_build_info(info: BuildInfo, output: &mut ProcessOutput) -> Option<String> {
    if let Some(stream) = info.stream {
        tracing::trace!(line = %stream.trim_end(), "build");
        output.stdout.push_str(&stream);
    }

    if let Some(status) = info.status {
        output.stdout.push_str(&status);
        output.stdout.push('\n');
    }

    let error = info.error.or_else(|| info.error_detail.and_then(|d| d.message));
    if let Some(error) = error {
        output.stderr.push_str(&error);
        output.stderr.push('\n');
        return Some(error);
    }

    None
}
