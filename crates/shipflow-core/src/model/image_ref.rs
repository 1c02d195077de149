use std::fmt;

/// ローカルストアにのみビルドされ、決してプッシュされないスコープ
pub const LOCAL_ONLY: &str = "local-only";

/// Dockerfile の FROM で宣言されたベースイメージ参照
///
/// 形式: `scope/name[:version]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseImageRef {
    pub tag: String,
}

impl BaseImageRef {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// 最初の `/` より前のスコープ部分
    pub fn scope(&self) -> Option<&str> {
        self.tag.split_once('/').map(|(scope, _)| scope)
    }

    pub fn is_local_only(&self) -> bool {
        self.scope() == Some(LOCAL_ONLY)
    }

    /// スコープ直後のパスセグメントからバージョンを除いた名前
    ///
    /// # Examples
    /// - `local-only/base-python:0.1` -> `Some("base-python")`
    /// - `local-only/base` -> `Some("base")`
    /// - `alpine:3.19` -> `None`
    pub fn short_name(&self) -> Option<&str> {
        let (_, rest) = self.tag.split_once('/')?;
        let segment = rest.split('/').next()?;
        let name = segment.split(':').next()?;
        if name.is_empty() { None } else { Some(name) }
    }
}

impl fmt::Display for BaseImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_only_reference() {
        let base = BaseImageRef::new("local-only/base-python-cpu:latest");
        assert!(base.is_local_only());
        assert_eq!(base.scope(), Some("local-only"));
        assert_eq!(base.short_name(), Some("base-python-cpu"));
    }

    #[test]
    fn test_remote_reference() {
        let base = BaseImageRef::new("docker.io/library/python:3.12");
        assert!(!base.is_local_only());
        assert_eq!(base.short_name(), Some("library"));
    }

    #[test]
    fn test_unscoped_reference() {
        let base = BaseImageRef::new("ubuntu:22.04");
        assert_eq!(base.scope(), None);
        assert!(!base.is_local_only());
        assert_eq!(base.short_name(), None);
    }

    #[test]
    fn test_local_only_without_version() {
        let base = BaseImageRef::new("local-only/base-node");
        assert_eq!(base.short_name(), Some("base-node"));
    }

    #[test]
    fn test_scope_is_exact_match() {
        // "local-only-mirror/..." は local-only ではない
        let base = BaseImageRef::new("local-only-mirror/base:1.0");
        assert!(!base.is_local_only());
    }
}
