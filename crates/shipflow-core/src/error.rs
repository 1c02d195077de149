use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("ビルドルートが見つかりません: {0}")]
    BuildRootNotFound(PathBuf),

    #[error("Dockerfile の探索パターンが不正です: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("正規表現のコンパイルエラー: {0}")]
    Regex(#[from] regex::Error),

    #[error("FROM 命令が見つかりません")]
    MissingFrom,

    #[error("Dockerfile 解析エラー: {path}\n理由: {message}")]
    DockerfileParse { path: PathBuf, message: String },

    #[error(
        "local-only イメージ間に循環依存が検出されました: {0}\nヒント: FROM local-only/... の参照関係を確認してください"
    )]
    DependencyCycle(String),

    #[error("ビルドタグは既に割り当て済みです: {unit} ({existing})")]
    BuildTagAlreadyAssigned { unit: String, existing: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
