//! Edits over a [`Forest`]. Every operation reads a settled forest and returns a
//! new one; the input is never touched. Unknown ids and edits that would break
//! the tree shape are no-ops. The `try_*` forms report those as `None`.

use crate::catalog;
use crate::forest::{BlockInstance, Forest, InstanceId, ParamValue, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields of an instance that `update` may change. Identity, children and
/// parent are fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub collapsed: Option<bool>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = Some(collapsed);
        self
    }
}

pub fn try_insert(
    forest: &Forest,
    definition_id: &str,
    position: Position,
) -> Option<(Forest, InstanceId)> {
    let Some(definition) = catalog::lookup(definition_id) else {
        log::debug!("insert ignored: unknown block '{}'", definition_id);
        return None;
    };
    let mut next = forest.clone();
    let id = next.allocate_id(definition);
    next.blocks_mut()
        .push(BlockInstance::new(id.clone(), definition, position));
    Some((next, id))
}

pub fn insert(forest: &Forest, definition_id: &str, position: Position) -> Forest {
    try_insert(forest, definition_id, position)
        .map(|(next, _)| next)
        .unwrap_or_else(|| forest.clone())
}

pub fn try_update(forest: &Forest, id: &InstanceId, patch: &Patch) -> Option<Forest> {
    let mut next = forest.clone();
    let Some(target) = find_mut(next.blocks_mut(), id) else {
        log::debug!("update ignored: no block '{}'", id);
        return None;
    };
    for (name, value) in &patch.parameters {
        if target.definition.param_spec(name).is_none() {
            log::debug!(
                "update of '{}' skips undeclared parameter '{}'",
                target.id,
                name
            );
            continue;
        }
        target.parameters.insert(name.clone(), value.clone());
    }
    if let Some(position) = patch.position {
        target.position = position;
    }
    if let Some(collapsed) = patch.collapsed {
        target.collapsed = collapsed;
    }
    Some(next)
}

pub fn update(forest: &Forest, id: &InstanceId, patch: &Patch) -> Forest {
    try_update(forest, id, patch).unwrap_or_else(|| forest.clone())
}

/// Removes `id` and its whole subtree; children are not promoted.
pub fn try_delete(forest: &Forest, id: &InstanceId) -> Option<Forest> {
    let mut next = forest.clone();
    match take(next.blocks_mut(), id) {
        Some(_) => Some(next),
        None => {
            log::debug!("delete ignored: no block '{}'", id);
            None
        }
    }
}

pub fn delete(forest: &Forest, id: &InstanceId) -> Forest {
    try_delete(forest, id).unwrap_or_else(|| forest.clone())
}

/// Moves `child_id` to the end of `parent_id`'s children.
pub fn try_group(forest: &Forest, parent_id: &InstanceId, child_id: &InstanceId) -> Option<Forest> {
    if parent_id == child_id {
        log::debug!("group ignored: '{}' cannot contain itself", child_id);
        return None;
    }
    let Some(child) = forest.find(child_id) else {
        log::debug!("group ignored: no child block '{}'", child_id);
        return None;
    };
    if child.subtree_contains(parent_id) {
        log::debug!(
            "group ignored: '{}' is nested inside '{}'",
            parent_id,
            child_id
        );
        return None;
    }
    let Some(parent) = forest.find(parent_id) else {
        log::debug!("group ignored: no parent block '{}'", parent_id);
        return None;
    };
    if !parent.definition.can_own_children() {
        log::debug!(
            "group ignored: '{}' ({}) cannot contain blocks",
            parent_id,
            parent.kind().as_str()
        );
        return None;
    }

    let mut next = forest.clone();
    let mut moved = take(next.blocks_mut(), child_id)?;
    moved.parent_id = Some(parent_id.clone());
    find_mut(next.blocks_mut(), parent_id)?.children.push(moved);
    Some(next)
}

pub fn group(forest: &Forest, parent_id: &InstanceId, child_id: &InstanceId) -> Forest {
    try_group(forest, parent_id, child_id).unwrap_or_else(|| forest.clone())
}

/// Detaches `child_id` from its parent and appends it to the top level.
pub fn try_ungroup(forest: &Forest, child_id: &InstanceId) -> Option<Forest> {
    if forest.blocks().iter().any(|b| &b.id == child_id) {
        log::debug!("ungroup ignored: '{}' is already top-level", child_id);
        return None;
    }
    let mut next = forest.clone();
    let Some(mut moved) = take(next.blocks_mut(), child_id) else {
        log::debug!("ungroup ignored: no block '{}'", child_id);
        return None;
    };
    moved.parent_id = None;
    next.blocks_mut().push(moved);
    Some(next)
}

pub fn ungroup(forest: &Forest, child_id: &InstanceId) -> Forest {
    try_ungroup(forest, child_id).unwrap_or_else(|| forest.clone())
}

fn find_mut<'a>(blocks: &'a mut [BlockInstance], id: &InstanceId) -> Option<&'a mut BlockInstance> {
    for block in blocks.iter_mut() {
        if &block.id == id {
            return Some(block);
        }
        if let Some(found) = find_mut(&mut block.children, id) {
            return Some(found);
        }
    }
    None
}

fn take(blocks: &mut Vec<BlockInstance>, id: &InstanceId) -> Option<BlockInstance> {
    if let Some(index) = blocks.iter().position(|b| &b.id == id) {
        return Some(blocks.remove(index));
    }
    blocks
        .iter_mut()
        .find_map(|block| take(&mut block.children, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: f64) -> Position {
        Position::new(0.0, y)
    }

    #[test]
    fn insert_unknown_block_leaves_forest_alone() {
        let forest = Forest::new();
        assert!(try_insert(&forest, "teleport", at(0.0)).is_none());
        assert_eq!(insert(&forest, "teleport", at(0.0)), forest);
    }

    #[test]
    fn insert_never_reuses_ids_after_delete() {
        let (forest, first) = try_insert(&Forest::new(), "print", at(0.0)).unwrap();
        let forest = delete(&forest, &first);
        let (_, second) = try_insert(&forest, "print", at(0.0)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn find_mut_reaches_deep_nodes() {
        let (forest, a) = try_insert(&Forest::new(), "for", at(0.0)).unwrap();
        let (forest, b) = try_insert(&forest, "if", at(10.0)).unwrap();
        let (forest, c) = try_insert(&forest, "print", at(20.0)).unwrap();
        let forest = group(&forest, &b, &c);
        let mut forest = group(&forest, &a, &b);
        let found = find_mut(forest.blocks_mut(), &c).unwrap();
        assert_eq!(found.parent_id.as_ref(), Some(&b));
    }
}
