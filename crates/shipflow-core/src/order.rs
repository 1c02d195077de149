//! ビルド順序の決定
//!
//! local-only ユニットはすべて他のユニットより先にビルドする。
//! local-only 同士の依存は安定なトポロジカルソートで解決し、
//! 循環がある場合は設定エラーとする。

use crate::error::{CoreError, Result};
use crate::model::{BuildUnit, UnitId};
use std::collections::BTreeSet;

/// ユニットをビルド順に並べる
///
/// 1. local-only ユニット（生成元が利用側より先、それ以外は入力順）
/// 2. それ以外のユニット（入力順）
pub fn order_units(all: &[BuildUnit], ids: &[UnitId]) -> Result<Vec<UnitId>> {
    let (local, remote): (Vec<UnitId>, Vec<UnitId>) =
        ids.iter().copied().partition(|id| all[id.index()].is_local_only());

    let mut ordered = topo_sort_local(all, &local)?;
    ordered.extend(remote);
    Ok(ordered)
}

/// local-only ユニット間の依存を考慮した安定ソート（Kahn法）
fn topo_sort_local(all: &[BuildUnit], local: &[UnitId]) -> Result<Vec<UnitId>> {
    let n = local.len();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];

    for (consumer, id) in local.iter().enumerate() {
        for base in &all[id.index()].base_images {
            if !base.is_local_only() {
                continue;
            }
            let Some(name) = base.short_name() else {
                continue;
            };
            for (producer, pid) in local.iter().enumerate() {
                if all[pid.index()].image_name() == name {
                    dependents[producer].push(consumer);
                    in_degree[consumer] += 1;
                }
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut ordered = Vec::with_capacity(n);

    while let Some(current) = ready.pop_first() {
        ordered.push(local[current]);
        for &next in &dependents[current] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if ordered.len() < n {
        let cycle: Vec<String> = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| all[local[i].index()].to_string())
            .collect();
        return Err(CoreError::DependencyCycle(cycle.join(", ")));
    }

    Ok(ordered)
}
