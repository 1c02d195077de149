//! Dockerfile パーサー
//!
//! ビルドユニットに必要なメタデータ（LABEL と FROM）だけを抽出します。
//!
//! ```dockerfile
//! FROM local-only/base-python-cpu:latest
//! LABEL IMAGE="dicom-parser"
//! LABEL VERSION="0.1.0"
//! LABEL REGISTRY="local-only"
//! ```

use crate::error::{CoreError, Result};
use crate::model::BaseImageRef;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Dockerfile から抽出したメタデータ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerfileMeta {
    pub image: Option<String>,
    pub version: Option<String>,
    pub registry: Option<String>,
    pub build_ignore: bool,
    pub base_images: Vec<BaseImageRef>,
}

pub struct DockerfileParser {
    from_re: Regex,
    label_re: Regex,
    pair_re: Regex,
}

impl DockerfileParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            from_re: Regex::new(r"(?i)^FROM\s+(?:--\S+\s+)*(\S+)(?:\s+AS\s+(\S+))?\s*$")?,
            label_re: Regex::new(r"(?i)^LABEL\s+(.+)$")?,
            pair_re: Regex::new(r#"([A-Za-z0-9_.\-]+)\s*=\s*(?:"([^"]*)"|(\S+))"#)?,
        })
    }

    pub fn parse_file(&self, path: &Path) -> Result<DockerfileMeta> {
        let content = std::fs::read_to_string(path)?;
        self.parse(&content).map_err(|e| match e {
            CoreError::MissingFrom => CoreError::DockerfileParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
            other => other,
        })
    }

    /// Dockerfile の内容をパース
    ///
    /// FROM 命令が1つもない場合は `CoreError::MissingFrom`。
    pub fn parse(&self, content: &str) -> Result<DockerfileMeta> {
        let mut meta = DockerfileMeta::default();
        let mut stage_aliases: HashSet<String> = HashSet::new();
        let mut saw_from = false;

        for line in logical_lines(content) {
            if let Some(caps) = self.from_re.captures(&line) {
                saw_from = true;
                let reference = caps[1].to_string();
                let is_stage = stage_aliases.contains(&reference.to_lowercase());
                if !is_stage && !reference.eq_ignore_ascii_case("scratch") {
                    let base = BaseImageRef::new(reference);
                    if !meta.base_images.contains(&base) {
                        meta.base_images.push(base);
                    }
                }
                if let Some(alias) = caps.get(2) {
                    stage_aliases.insert(alias.as_str().to_lowercase());
                }
                continue;
            }

            if let Some(caps) = self.label_re.captures(&line) {
                for pair in self.pair_re.captures_iter(&caps[1]) {
                    let value = pair
                        .get(2)
                        .or_else(|| pair.get(3))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    match &pair[1] {
                        "IMAGE" => meta.image = Some(value),
                        "VERSION" => meta.version = Some(value),
                        "REGISTRY" => meta.registry = Some(value),
                        "BUILD_IGNORE" => meta.build_ignore = value.eq_ignore_ascii_case("true"),
                        _ => {}
                    }
                }
            }
        }

        if !saw_from {
            return Err(CoreError::MissingFrom);
        }

        Ok(meta)
    }
}

/// 継続行（末尾の `\`）を結合し、コメントと空行を除いた論理行
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for raw in content.lines() {
        let trimmed = raw.trim();
        if trimmed.starts_with('#') || (trimmed.is_empty() && current.is_empty()) {
            continue;
        }
        if let Some(stripped) = trimmed.strip_suffix('\\') {
            current.push_str(stripped.trim_end());
            current.push(' ');
            continue;
        }
        current.push_str(trimmed);
        lines.push(std::mem::take(&mut current).trim().to_string());
    }

    if !current.trim().is_empty() {
        lines.push(current.trim().to_string());
    }

    lines
}
