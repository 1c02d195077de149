pub mod plan;
pub mod run;

use clap::Args;
use shipflow_config::RunConfig;
use shipflow_core::{BatchPlan, DockerfileCollector, Selection, UnitSource};
use std::path::PathBuf;

/// `run` と `plan` で共通の対象選択オプション
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// イメージ名の部分一致フィルタ (IMAGE_FILTER)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// ビルドするイメージ名（カンマ区切り、CORE_IMAGES）
    #[arg(short, long, value_delimiter = ',')]
    pub images: Vec<String>,

    /// プッシュ先レジストリ (DEFAULT_REGISTRY)
    #[arg(short, long)]
    pub registry: Option<String>,

    /// VERSION ラベルがないイメージのバージョン (BUILD_VERSION)
    #[arg(long = "version", value_name = "VERSION")]
    pub build_version: Option<String>,

    /// Dockerfile を探索するディレクトリ
    #[arg(long)]
    pub root: Option<PathBuf>,
}

impl SelectionArgs {
    /// CLI オプションで設定を上書き
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(filter) = self.filter.as_ref().filter(|f| !f.is_empty()) {
            config.image_filter = Some(filter.clone());
        }

        let images: Vec<String> = self
            .images
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !images.is_empty() {
            config.whitelist = images;
        }

        if let Some(registry) = &self.registry {
            config.default_registry = registry.clone();
        }
        if let Some(version) = &self.build_version {
            config.build_version = version.clone();
        }
        if let Some(root) = &self.root {
            config.build_root = root.clone();
        }
    }
}

/// Dockerfile を収集し、選択・閉包・順序付けまで行う
pub fn resolve_plan(config: &RunConfig) -> anyhow::Result<BatchPlan> {
    let collector = DockerfileCollector::new(&config.build_root, &config.default_registry)
        .with_ignore_patterns(config.ignore_patterns.clone());
    let units = collector.collect()?;

    let selection = Selection::new(config.image_filter.clone(), config.whitelist.clone());
    Ok(BatchPlan::resolve(units, &selection)?)
}
