use crate::model::{BuildUnit, UnitId};

/// ビルド対象の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// イメージ名の部分一致フィルタ（大文字小文字を区別）
    pub filter: Option<String>,
    /// 明示的なイメージ名のホワイトリスト
    pub whitelist: Vec<String>,
}

impl Selection {
    pub fn new(filter: Option<String>, whitelist: Vec<String>) -> Self {
        Self { filter, whitelist }
    }

    pub fn has_whitelist(&self) -> bool {
        !self.whitelist.is_empty()
    }

    /// フィルタ → ホワイトリストの順に適用し、残ったユニットを元の順序で返す
    pub fn select(&self, units: &[BuildUnit]) -> Vec<UnitId> {
        let filter = self.filter.as_deref().filter(|f| !f.is_empty());

        units
            .iter()
            .enumerate()
            .filter(|(_, unit)| filter.is_none_or(|f| unit.image_name().contains(f)))
            .filter(|(_, unit)| {
                self.whitelist.is_empty() || self.whitelist.iter().any(|w| w == unit.image_name())
            })
            .map(|(index, _)| UnitId(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> Vec<BuildUnit> {
        ["base-python", "dicom-parser", "landing-page", "python-worker"]
            .iter()
            .map(|name| BuildUnit::new(format!("{}/Dockerfile", name), "r").with_image_name(*name))
            .collect()
    }

    fn names(units: &[BuildUnit], ids: &[UnitId]) -> Vec<String> {
        ids.iter()
            .map(|id| units[id.index()].image_name().to_string())
            .collect()
    }

    #[test]
    fn test_select_all_without_criteria() {
        let units = units();
        let ids = Selection::default().select(&units);
        assert_eq!(ids.len(), units.len());
    }

    #[test]
    fn test_select_by_substring() {
        let units = units();
        let selection = Selection::new(Some("python".to_string()), vec![]);
        assert_eq!(
            names(&units, &selection.select(&units)),
            vec!["base-python", "python-worker"]
        );
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let units = units();
        let selection = Selection::new(Some("Python".to_string()), vec![]);
        assert!(selection.select(&units).is_empty());
    }

    #[test]
    fn test_empty_filter_is_ignored() {
        let units = units();
        let selection = Selection::new(Some(String::new()), vec![]);
        assert_eq!(selection.select(&units).len(), 4);
    }

    #[test]
    fn test_whitelist_applies_after_filter() {
        let units = units();
        let selection = Selection::new(
            Some("python".to_string()),
            vec!["python-worker".to_string(), "landing-page".to_string()],
        );
        assert_eq!(names(&units, &selection.select(&units)), vec!["python-worker"]);
    }

    #[test]
    fn test_whitelist_unknown_image_yields_empty() {
        let units = units();
        let selection = Selection::new(None, vec!["does-not-exist".to_string()]);
        assert!(selection.select(&units).is_empty());
    }
}
