//! shipflow コア
//!
//! コンテナイメージ群（ビルドユニット）のビルド・プッシュを
//! 選択 → 依存閉包 → 順序付け → 実行 → 集計 のパイプラインで行います。

pub mod closure;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod model;
pub mod order;
pub mod parser;
pub mod plan;
pub mod report;
pub mod runner;
pub mod selector;

pub use closure::{Closure, resolve_closure};
pub use discovery::{DockerfileCollector, UnitSource, find_dockerfiles};
pub use engine::{BuildOutcome, EngineError, EngineResult, ImageEngine, PushOutcome};
pub use error::{CoreError, Result};
pub use model::*;
pub use order::order_units;
pub use parser::{DockerfileMeta, DockerfileParser};
pub use plan::BatchPlan;
pub use report::{
    BatchSummary, ConsoleReporter, FailureKind, ProgressLine, Reporter, Step, UnitFailure,
};
pub use runner::{BatchRunner, RunOptions, flat_build_tag};
pub use selector::Selection;
