//! ビルドユニットの自動発見
//!
//! ビルドルート配下の Dockerfile を探索し、ビルドユニットを生成します。

use crate::error::{CoreError, Result};
use crate::model::BuildUnit;
use crate::parser::DockerfileParser;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// ビルドユニットの供給元
pub trait UnitSource {
    fn collect(&self) -> Result<Vec<BuildUnit>>;
}

impl UnitSource for Vec<BuildUnit> {
    fn collect(&self) -> Result<Vec<BuildUnit>> {
        Ok(self.clone())
    }
}

/// Dockerfile ベースのユニット収集
#[derive(Debug, Clone)]
pub struct DockerfileCollector {
    root: PathBuf,
    default_registry: String,
    ignore_patterns: Vec<String>,
}

impl DockerfileCollector {
    pub fn new(root: impl Into<PathBuf>, default_registry: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            default_registry: default_registry.into(),
            ignore_patterns: Vec::new(),
        }
    }

    /// パスにこの文字列を含む Dockerfile を除外する
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let path = relative.to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|p| !p.is_empty() && path.contains(p.as_str()))
    }
}

impl UnitSource for DockerfileCollector {
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    fn collect(&self) -> Result<Vec<BuildUnit>> {
        let parser = DockerfileParser::new()?;
        let mut units = Vec::new();

        for path in find_dockerfiles(&self.root)? {
            if self.is_ignored(&path) {
                debug!(path = %path.display(), "Skipping ignored Dockerfile");
                continue;
            }

            let meta = match parser.parse_file(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unparsable Dockerfile");
                    continue;
                }
            };

            if meta.build_ignore {
                debug!(path = %path.display(), "Skipping Dockerfile with BUILD_IGNORE");
                continue;
            }

            let registry = meta
                .registry
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| self.default_registry.clone());

            let mut unit = BuildUnit::new(path, registry);
            unit.image_name = meta.image.filter(|n| !n.is_empty());
            unit.version = meta.version.filter(|v| !v.is_empty());
            unit.base_images = meta.base_images;
            units.push(unit);
        }

        info!(count = units.len(), "Collected build units");
        Ok(units)
    }
}

/// ビルドルート配下の Dockerfile をパス順に列挙
#[tracing::instrument]
pub fn find_dockerfiles(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(CoreError::BuildRootNotFound(root.to_path_buf()));
    }

    let pattern = root.join("**").join("Dockerfile");
    let pattern = pattern.to_string_lossy();

    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read directory entry");
                None
            }
        })
        .collect();
    files.sort();

    debug!(count = files.len(), "Found Dockerfiles");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_dockerfile(root: &Path, dir: &str, content: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Dockerfile"), content).unwrap();
    }

    #[test]
    fn test_collect_units() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        write_dockerfile(
            root,
            "base/python",
            "FROM ubuntu:22.04\nLABEL IMAGE=\"base-python\"\nLABEL REGISTRY=\"local-only\"\n",
        );
        write_dockerfile(
            root,
            "services/api",
            "FROM local-only/base-python:latest\nLABEL IMAGE=\"api\"\nLABEL VERSION=\"1.2.0\"\n",
        );

        let collector = DockerfileCollector::new(root, "ghcr.io/org/dist");
        let units = collector.collect().unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].image_name(), "base-python");
        assert!(units[0].is_local_only());

        assert_eq!(units[1].image_name(), "api");
        assert_eq!(units[1].registry, "ghcr.io/org/dist");
        assert_eq!(units[1].version.as_deref(), Some("1.2.0"));
        assert_eq!(units[1].base_images.len(), 1);
        assert!(units[1].base_images[0].is_local_only());
    }

    #[test]
    fn test_collect_skips_ignored_paths() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        write_dockerfile(root, "services/app", "FROM alpine\nLABEL IMAGE=\"app\"\n");
        write_dockerfile(
            root,
            "templates_and_examples/demo",
            "FROM alpine\nLABEL IMAGE=\"demo\"\n",
        );

        let collector = DockerfileCollector::new(root, "r")
            .with_ignore_patterns(vec!["templates_and_examples".to_string()]);
        let units = collector.collect().unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].image_name(), "app");
    }

    #[test]
    fn test_collect_skips_build_ignore_and_broken_files() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        write_dockerfile(root, "a", "FROM alpine\nLABEL IMAGE=\"a\"\n");
        write_dockerfile(root, "b", "FROM alpine\nLABEL IMAGE=\"b\" BUILD_IGNORE=\"True\"\n");
        write_dockerfile(root, "c", "LABEL IMAGE=\"c\"\n");

        let units = DockerfileCollector::new(root, "r").collect().unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].image_name(), "a");
    }

    #[test]
    fn test_in_memory_source() {
        let source = vec![
            BuildUnit::new("a/Dockerfile", "r").with_image_name("a"),
            BuildUnit::new("b/Dockerfile", "r").with_image_name("b"),
        ];
        let units = source.collect().unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].image_name(), "b");
    }

    #[test]
    fn test_find_dockerfiles_missing_root() {
        let temp_dir = tempdir().unwrap();
        let result = find_dockerfiles(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(CoreError::BuildRootNotFound(_))));
    }

    #[test]
    fn test_find_dockerfiles_sorted() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write_dockerfile(root, "z", "FROM alpine\n");
        write_dockerfile(root, "a/b", "FROM alpine\n");
        write_dockerfile(root, "m", "FROM alpine\n");

        let files = find_dockerfiles(root).unwrap();
        assert_eq!(
            files,
            vec![
                root.join("a/b/Dockerfile"),
                root.join("m/Dockerfile"),
                root.join("z/Dockerfile"),
            ]
        );
    }
}
