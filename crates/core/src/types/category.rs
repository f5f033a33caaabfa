//! Category hierarchy rules.

use std::collections::{HashMap, HashSet};

use super::id::CategoryId;

/// Whether making `candidate_parent` the parent of `node` would close a loop.
///
/// `parents` maps every category to its current parent. The walk goes up
/// from `candidate_parent`; reaching `node` (or revisiting a category, which
/// means the stored tree is already corrupt) counts as a cycle.
#[must_use]
pub fn would_create_cycle(
    parents: &HashMap<CategoryId, Option<CategoryId>>,
    node: CategoryId,
    candidate_parent: CategoryId,
) -> bool {
    let mut visited = HashSet::new();
    let mut cursor = Some(candidate_parent);
    while let Some(current) = cursor {
        if current == node || !visited.insert(current) {
            return true;
        }
        cursor = parents.get(&current).copied().flatten();
    }
    false
}

/// Ancestors of `node`, root first, ending with `node` itself.
///
/// Stops early if the chain loops or leaves the map.
#[must_use]
pub fn ancestry(
    parents: &HashMap<CategoryId, Option<CategoryId>>,
    node: CategoryId,
) -> Vec<CategoryId> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if !visited.insert(current) {
            break;
        }
        chain.push(current);
        cursor = parents.get(&current).copied().flatten();
    }
    chain.reverse();
    chain
}
