//! local-only ベースイメージの依存閉包
//!
//! 選択されたユニットが `FROM local-only/...` で参照するイメージは
//! リモートレジストリに存在しないため、同じバッチ内でビルドする必要がある。
//! 参照を推移的にたどり、それらを生成するユニットを追加する。

use crate::model::{BuildUnit, UnitId, UnitKey};
use std::collections::HashSet;
use tracing::{debug, warn};

/// 閉包計算の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    /// シード ∪ 追加ユニット（重複排除済み、シードが先頭）
    pub units: Vec<UnitId>,
    /// 閉包によって追加されたユニット
    pub added: Vec<UnitId>,
    /// 生成元ユニットが見つからなかった local-only イメージ名
    pub unresolved: Vec<String>,
}

/// シードから必要な local-only ベースイメージの生成元を推移的に解決
///
/// 生成元の探索はコレクション全体（`all`）を対象とする。
/// 循環参照は訪問済み集合によって停止し、エラーにはならない。
pub fn resolve_closure(all: &[BuildUnit], seed: &[UnitId]) -> Closure {
    let mut frontier: Vec<UnitId> = seed.to_vec();
    let mut visited: HashSet<UnitId> = HashSet::new();
    let mut required: HashSet<String> = HashSet::new();
    let mut unresolved: Vec<String> = Vec::new();

    while let Some(id) = frontier.pop() {
        if !visited.insert(id) {
            continue;
        }

        for base in &all[id.index()].base_images {
            if !base.is_local_only() {
                continue;
            }
            let Some(name) = base.short_name() else {
                continue;
            };
            if !required.insert(name.to_string()) {
                continue;
            }

            let producers: Vec<UnitId> = all
                .iter()
                .enumerate()
                .filter(|(_, unit)| unit.image_name() == name)
                .map(|(index, _)| UnitId(index))
                .collect();

            if producers.is_empty() {
                warn!(
                    base_image = %base,
                    consumer = %all[id.index()],
                    "No build unit produces required local-only base image; assuming it is pre-built"
                );
                unresolved.push(name.to_string());
            } else {
                debug!(base_image = %base, "Resolved local-only base image producer");
                frontier.extend(producers);
            }
        }
    }

    let additions = all
        .iter()
        .enumerate()
        .filter(|(_, unit)| required.contains(unit.image_name()))
        .map(|(index, _)| UnitId(index));

    let mut seen: HashSet<UnitKey> = HashSet::new();
    let mut units = Vec::new();
    let mut added = Vec::new();
    let seed_set: HashSet<UnitId> = seed.iter().copied().collect();

    for id in seed.iter().copied().chain(additions) {
        if !seen.insert(all[id.index()].key()) {
            continue;
        }
        units.push(id);
        if !seed_set.contains(&id) {
            added.push(id);
        }
    }

    Closure {
        units,
        added,
        unresolved,
    }
}
