use crate::error::{BuildError, BuildResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use shipflow_core::BuildUnit;
use std::path::Path;
use tar::Builder;

/// これを超えるコンテキストは警告を出す
const LARGE_CONTEXT_BYTES: usize = 500 * 1024 * 1024;

/// Docker デーモンに送るビルドコンテキスト
#[derive(Debug)]
pub struct BuildContext {
    /// tar.gz アーカイブ
    pub archive: Vec<u8>,
    /// アーカイブ内の Dockerfile のパス
    pub dockerfile: String,
}

pub struct ContextBuilder;

impl ContextBuilder {
    /// ユニットの Dockerfile があるディレクトリをコンテキストとしてアーカイブする
    pub fn for_unit(unit: &BuildUnit) -> BuildResult<BuildContext> {
        Self::create_context(unit.context_dir(), &unit.path)
    }

    pub fn create_context(context_dir: &Path, dockerfile: &Path) -> BuildResult<BuildContext> {
        if !context_dir.is_dir() {
            return Err(BuildError::ContextNotFound(context_dir.to_path_buf()));
        }
        if !dockerfile.is_file() {
            return Err(BuildError::DockerfileNotFound(dockerfile.to_path_buf()));
        }

        tracing::debug!(context = %context_dir.display(), "Creating build context");

        let mut archive = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive, Compression::default());
            let mut tar = Builder::new(encoder);
            tar.follow_symlinks(false);
            tar.append_dir_all(".", context_dir)?;
            tar.into_inner()?.finish()?;
        }

        // コンテキスト外の Dockerfile は想定しない
        let dockerfile = dockerfile
            .strip_prefix(context_dir)
            .ok()
            .and_then(|p| p.to_str())
            .map(|p| p.replace('\\', "/"))
            .unwrap_or_else(|| "Dockerfile".to_string());

        tracing::debug!(bytes = archive.len(), dockerfile = %dockerfile, "Build context created");

        if archive.len() > LARGE_CONTEXT_BYTES {
            tracing::warn!(
                context = %context_dir.display(),
                size_mb = archive.len() / 1024 / 1024,
                "Build context is large; consider a .dockerignore"
            );
        }

        Ok(BuildContext {
            archive,
            dockerfile,
        })
    }
}
