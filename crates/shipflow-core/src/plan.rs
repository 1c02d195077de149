use crate::closure::resolve_closure;
use crate::error::Result;
use crate::model::{BuildUnit, UnitId};
use crate::order::order_units;
use crate::selector::Selection;
use tracing::info;

/// 選択・閉包・順序付けを済ませたバッチ
#[derive(Debug, Clone)]
pub struct BatchPlan {
    units: Vec<BuildUnit>,
    order: Vec<UnitId>,
    added: Vec<UnitId>,
    unresolved: Vec<String>,
}

impl BatchPlan {
    /// ユニットコレクションからバッチを組み立てる
    ///
    /// ホワイトリストが指定された場合のみ、その結果をシードとして
    /// local-only ベースイメージの閉包を計算する。
    pub fn resolve(units: Vec<BuildUnit>, selection: &Selection) -> Result<Self> {
        let selected = selection.select(&units);

        let (members, added, unresolved) = if selection.has_whitelist() {
            let closure = resolve_closure(&units, &selected);
            (closure.units, closure.added, closure.unresolved)
        } else {
            (selected, Vec::new(), Vec::new())
        };

        let order = order_units(&units, &members)?;

        info!(
            collected = units.len(),
            planned = order.len(),
            added = added.len(),
            "Resolved build plan"
        );

        Ok(Self {
            units,
            order,
            added,
            unresolved,
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn order(&self) -> &[UnitId] {
        &self.order
    }

    /// 閉包によって追加されたユニット
    pub fn added(&self) -> &[UnitId] {
        &self.added
    }

    pub fn is_added(&self, id: UnitId) -> bool {
        self.added.contains(&id)
    }

    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    pub fn unit(&self, id: UnitId) -> &BuildUnit {
        &self.units[id.index()]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut BuildUnit {
        &mut self.units[id.index()]
    }

    /// ビルド順のユニット
    pub fn ordered_units(&self) -> impl Iterator<Item = &BuildUnit> {
        self.order.iter().map(|id| &self.units[id.index()])
    }
}
