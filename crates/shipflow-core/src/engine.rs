//! コンテナエンジンとの境界

use crate::model::{BuildStatus, BuildUnit, Issue, PushStatus};
use std::time::Duration;

/// エンジン呼び出しで発生した想定外のエラー
///
/// ビルド失敗のような想定内の結果は `Issue` として返し、
/// これはユニット単位の処理を打ち切るエラーにのみ使う。
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub status: BuildStatus,
    pub issue: Option<Issue>,
    pub duration: Duration,
}

impl BuildOutcome {
    pub fn new(status: BuildStatus, duration: Duration) -> Self {
        Self {
            status,
            issue: None,
            duration,
        }
    }

    pub fn failed(issue: Issue, duration: Duration) -> Self {
        Self {
            status: BuildStatus::Failed,
            issue: Some(issue),
            duration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub status: PushStatus,
    pub issue: Option<Issue>,
    pub duration: Duration,
}

impl PushOutcome {
    pub fn new(status: PushStatus, duration: Duration) -> Self {
        Self {
            status,
            issue: None,
            duration,
        }
    }

    pub fn failed(issue: Issue, duration: Duration) -> Self {
        Self {
            status: PushStatus::Failed,
            issue: Some(issue),
            duration,
        }
    }
}

/// イメージのビルド・タグ付け・プッシュを行うエンジン
///
/// 呼び出しは常に1ユニットずつ逐次的に行われる。
#[allow(async_fn_in_trait)]
pub trait ImageEngine {
    /// ビルド前チェック（Dockerfile やベースイメージの存在確認）
    async fn precheck(&self, unit: &BuildUnit) -> EngineResult<Option<Issue>>;

    /// `unit.build_tag()` でイメージをビルド
    async fn build(&self, unit: &BuildUnit) -> EngineResult<BuildOutcome>;

    /// ローカルストア内でイメージに別名を付ける
    async fn tag(&self, source: &str, target: &str) -> EngineResult<()>;

    /// `unit.build_tag()` をレジストリにプッシュ
    async fn push(&self, unit: &BuildUnit) -> EngineResult<PushOutcome>;
}
