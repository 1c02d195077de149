//! shipflow の実行設定
//!
//! 優先順位（低 → 高）:
//! 1. 組み込みデフォルト
//! 2. `shipflow.kdl`
//! 3. 環境変数 (`DEFAULT_REGISTRY`, `IMAGE_FILTER`, `CORE_IMAGES`, `BUILD_VERSION`)
//! 4. CLI オプション（呼び出し側で上書き）

pub mod error;

pub use error::*;

use kdl::{KdlDocument, KdlNode};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_REGISTRY: &str = "docker.io/zwh188222/densematrix";
pub const DEFAULT_BUILD_VERSION: &str = "0.5.1";
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["templates_and_examples"];

pub const CONFIG_FILENAME: &str = "shipflow.kdl";
pub const CONFIG_PATH_ENV: &str = "SHIPFLOW_CONFIG_PATH";

pub const ENV_REGISTRY: &str = "DEFAULT_REGISTRY";
pub const ENV_IMAGE_FILTER: &str = "IMAGE_FILTER";
pub const ENV_CORE_IMAGES: &str = "CORE_IMAGES";
pub const ENV_BUILD_VERSION: &str = "BUILD_VERSION";

/// 1回のバッチ実行の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// プッシュ先レジストリ
    pub default_registry: String,
    /// イメージ名の部分一致フィルタ
    pub image_filter: Option<String>,
    /// ビルド対象イメージ名のホワイトリスト
    pub whitelist: Vec<String>,
    /// VERSION ラベルがないイメージのバージョン
    pub build_version: String,
    /// Dockerfile を探索するルート
    pub build_root: PathBuf,
    /// パスにこれらを含む Dockerfile は無視する
    pub ignore_patterns: Vec<String>,
    /// 変更のないイメージのプッシュを省略する
    pub skip_push_no_changes: bool,
    pub push_enabled: bool,
    pub no_cache: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_registry: DEFAULT_REGISTRY.to_string(),
            image_filter: None,
            whitelist: Vec::new(),
            build_version: DEFAULT_BUILD_VERSION.to_string(),
            build_root: PathBuf::from("."),
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_push_no_changes: true,
            push_enabled: true,
            no_cache: false,
        }
    }
}

impl RunConfig {
    /// デフォルト → 設定ファイル → 環境変数 の順に読み込む
    ///
    /// `explicit` が指定された場合はファイル探索を行わない。
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let file = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };

        if let Some(path) = file {
            info!(config = %path.display(), "Loading config file");
            config.apply_file(&path)?;
        }

        config.apply_env();
        Ok(config)
    }

    /// `shipflow.kdl` を適用（相対 build-root はファイルの位置から解決）
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let previous_root = self.build_root.clone();
        self.apply_kdl(&content)?;

        if self.build_root != previous_root
            && self.build_root.is_relative()
            && let Some(parent) = path.parent()
        {
            self.build_root = parent.join(&self.build_root);
        }
        Ok(())
    }

    pub fn apply_kdl(&mut self, content: &str) -> Result<()> {
        let doc: KdlDocument = content.parse()?;

        for node in doc.nodes() {
            let name = node.name().value();
            match name {
                "registry" => self.default_registry = single_string(node)?,
                "version" => self.build_version = single_string(node)?,
                "filter" => self.image_filter = Some(single_string(node)?),
                "build-root" => self.build_root = PathBuf::from(single_string(node)?),
                "images" => self.whitelist = string_args(node),
                "ignore" => self.ignore_patterns = string_args(node),
                "skip-push-no-changes" => self.skip_push_no_changes = single_bool(node)?,
                "push" => self.push_enabled = single_bool(node)?,
                "no-cache" => self.no_cache = single_bool(node)?,
                other => debug!(node = other, "Ignoring unknown config node"),
            }
        }

        Ok(())
    }

    /// 環境変数を適用（空の値は無視）
    pub fn apply_env(&mut self) {
        if let Some(registry) = env_value(ENV_REGISTRY) {
            self.default_registry = registry;
        }
        if let Some(filter) = env_value(ENV_IMAGE_FILTER) {
            self.image_filter = Some(filter);
        }
        if let Some(images) = env_value(ENV_CORE_IMAGES) {
            self.whitelist = parse_image_list(&images);
        }
        if let Some(version) = env_value(ENV_BUILD_VERSION) {
            self.build_version = version;
        }
    }
}

/// カンマ区切りのイメージ名リストをパース（空要素は除外）
pub fn parse_image_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positional(node: &KdlNode) -> impl Iterator<Item = &kdl::KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| e.value())
}

fn string_args(node: &KdlNode) -> Vec<String> {
    positional(node)
        .filter_map(|v| v.as_string())
        .map(str::to_string)
        .collect()
}

fn single_string(node: &KdlNode) -> Result<String> {
    positional(node)
        .next()
        .and_then(|v| v.as_string())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::InvalidValue {
            node: node.name().value().to_string(),
            message: "文字列の値が必要です".to_string(),
        })
}

fn single_bool(node: &KdlNode) -> Result<bool> {
    positional(node)
        .next()
        .and_then(|v| v.as_bool())
        .ok_or_else(|| ConfigError::InvalidValue {
            node: node.name().value().to_string(),
            message: "真偽値 (#true / #false) が必要です".to_string(),
        })
}

/// shipflow.kdl を探す
///
/// 1. 環境変数 SHIPFLOW_CONFIG_PATH
/// 2. カレントディレクトリ: shipflow.kdl, .shipflow/shipflow.kdl
/// 3. ~/.config/shipflow/shipflow.kdl
///
/// 設定ファイルは必須ではないため、見つからない場合は None を返す。
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let candidates = [
            current_dir.join(CONFIG_FILENAME),
            current_dir.join(".shipflow").join(CONFIG_FILENAME),
        ];
        if let Some(path) = candidates.into_iter().find(|p| p.exists()) {
            return Some(path);
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("shipflow").join(CONFIG_FILENAME))
        .filter(|p| p.exists())
}
