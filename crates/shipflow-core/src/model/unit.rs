use super::image_ref::{BaseImageRef, LOCAL_ONLY};
use super::status::{BuildStatus, Issue, PushStatus};
use crate::error::{CoreError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// バッチ内でのユニット識別子（コレクション内の位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// 重複排除キー: イメージ名、なければ Dockerfile パス
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitKey {
    Image(String),
    Path(PathBuf),
}

/// ビルドユニット（1つの Dockerfile と、そのビルド・プッシュ状態）
#[derive(Debug, Clone)]
pub struct BuildUnit {
    /// LABEL IMAGE で宣言されたイメージ名
    pub image_name: Option<String>,
    /// Dockerfile のパス
    pub path: PathBuf,
    /// FROM で宣言されたベースイメージ
    pub base_images: Vec<BaseImageRef>,
    /// ターゲットスコープ（local-only またはレジストリ）
    pub registry: String,
    /// LABEL VERSION で宣言されたバージョン
    pub version: Option<String>,
    /// プッシュ前にローカル専用イメージとして扱うか
    pub local_image: bool,
    pub build_status: BuildStatus,
    pub build_issue: Option<Issue>,
    pub push_status: PushStatus,
    pub push_issue: Option<Issue>,
    build_tag: Option<String>,
}

impl BuildUnit {
    pub fn new(path: impl Into<PathBuf>, registry: impl Into<String>) -> Self {
        let registry = registry.into();
        Self {
            image_name: None,
            path: path.into(),
            base_images: Vec::new(),
            local_image: registry == LOCAL_ONLY,
            registry,
            version: None,
            build_status: BuildStatus::default(),
            build_issue: None,
            push_status: PushStatus::default(),
            push_issue: None,
            build_tag: None,
        }
    }

    pub fn with_image_name(mut self, name: impl Into<String>) -> Self {
        self.image_name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_base_image(mut self, tag: impl Into<String>) -> Self {
        self.base_images.push(BaseImageRef::new(tag));
        self
    }

    pub fn image_name(&self) -> &str {
        self.image_name.as_deref().unwrap_or("")
    }

    pub fn is_local_only(&self) -> bool {
        self.registry == LOCAL_ONLY
    }

    pub fn key(&self) -> UnitKey {
        match &self.image_name {
            Some(name) if !name.is_empty() => UnitKey::Image(name.clone()),
            _ => UnitKey::Path(self.path.clone()),
        }
    }

    /// ビルドコンテキスト（Dockerfile のあるディレクトリ）
    pub fn context_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// 宣言上のタグ: `{registry}/{image_name}:{version}`
    ///
    /// local-only イメージを参照する後続ユニットはこのタグで FROM する。
    pub fn declared_tag(&self, default_version: &str) -> String {
        format!(
            "{}/{}:{}",
            self.registry,
            self.image_name.as_deref().unwrap_or("image"),
            self.resolved_version(default_version)
        )
    }

    pub fn resolved_version<'a>(&'a self, default_version: &'a str) -> &'a str {
        match self.version.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => default_version,
        }
    }

    pub fn build_tag(&self) -> Option<&str> {
        self.build_tag.as_deref()
    }

    /// ビルドタグを割り当てる（1回のみ）
    pub fn assign_build_tag(&mut self, tag: impl Into<String>) -> Result<()> {
        if let Some(existing) = &self.build_tag {
            return Err(CoreError::BuildTagAlreadyAssigned {
                unit: self.to_string(),
                existing: existing.clone(),
            });
        }
        self.build_tag = Some(tag.into());
        Ok(())
    }
}

impl fmt::Display for BuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.image_name {
            Some(name) if !name.is_empty() => f.write_str(name),
            _ => write!(f, "{}", self.path.display()),
        }
    }
}
