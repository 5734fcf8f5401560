use crate::catalog::{self, BlockDefinition, BlockKind, ParamKind};
use crate::error::{ProjectError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::ops::Deref;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing `-<n>` serial of generated ids, if present.
    fn serial(&self) -> Option<u64> {
        self.0.rsplit_once('-').and_then(|(_, n)| n.parse().ok())
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn parse(kind: ParamKind, raw: &str) -> Self {
        match kind {
            ParamKind::Text => ParamValue::Text(raw.to_string()),
            ParamKind::Number => raw
                .trim()
                .parse::<f64>()
                .map(ParamValue::Number)
                .unwrap_or_else(|_| ParamValue::Text(raw.to_string())),
            ParamKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => ParamValue::Bool(true),
                "false" => ParamValue::Bool(false),
                _ => ParamValue::Text(raw.to_string()),
            },
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Bool(true) => f.write_str("True"),
            ParamValue::Bool(false) => f.write_str("False"),
            ParamValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            ParamValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Shared, read-only reference to a catalog entry. Serialized as the block id.
#[derive(Clone, Copy)]
pub struct BlockRef(&'static BlockDefinition);

impl BlockRef {
    pub fn new(definition: &'static BlockDefinition) -> Self {
        Self(definition)
    }

    pub fn definition(&self) -> &'static BlockDefinition {
        self.0
    }
}

impl Deref for BlockRef {
    type Target = BlockDefinition;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl PartialEq for BlockRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl std::fmt::Debug for BlockRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockRef({})", self.0.id)
    }
}

impl Serialize for BlockRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.id)
    }
}

impl<'de> Deserialize<'de> for BlockRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        catalog::lookup(&id)
            .map(BlockRef)
            .ok_or_else(|| D::Error::custom(format!("unknown block '{}'", id)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInstance {
    pub id: InstanceId,
    #[serde(rename = "block")]
    pub definition: BlockRef,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub children: Vec<BlockInstance>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<InstanceId>,
}

impl BlockInstance {
    pub fn new(id: InstanceId, definition: &'static BlockDefinition, position: Position) -> Self {
        let mut instance = Self {
            id,
            definition: BlockRef::new(definition),
            position,
            parameters: BTreeMap::new(),
            children: Vec::new(),
            collapsed: false,
            parent_id: None,
        };
        instance.fill_defaults();
        instance
    }

    pub fn kind(&self) -> BlockKind {
        self.definition.kind
    }

    /// Current value of `name`, falling back to the declared default.
    pub fn param(&self, name: &str) -> Option<ParamValue> {
        if let Some(value) = self.parameters.get(name) {
            return Some(value.clone());
        }
        self.definition
            .param_spec(name)
            .and_then(|spec| spec.default_value())
    }

    /// Like [`BlockInstance::param`], rendered as text; unset renders empty.
    pub fn param_text(&self, name: &str) -> String {
        self.param(name).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn find(&self, id: &InstanceId) -> Option<&BlockInstance> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// True when `id` names this instance or any descendant.
    pub fn subtree_contains(&self, id: &InstanceId) -> bool {
        self.find(id).is_some()
    }

    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(BlockInstance::subtree_len).sum::<usize>()
    }

    pub fn subtree_depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(BlockInstance::subtree_depth)
            .max()
            .unwrap_or(0)
    }

    fn fill_defaults(&mut self) {
        let definition = self.definition.definition();
        for spec in definition.parameters {
            if self.parameters.contains_key(spec.name) {
                continue;
            }
            if let Some(value) = spec.default_value() {
                self.parameters.insert(spec.name.to_string(), value);
            }
        }
        for child in &mut self.children {
            child.fill_defaults();
        }
    }
}

/// Every block on the canvas: the ordered top-level sequence plus, through
/// ownership, all nested children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<BlockInstance>", into = "Vec<BlockInstance>")]
pub struct Forest {
    blocks: Vec<BlockInstance>,
    next_serial: u64,
}

impl From<Vec<BlockInstance>> for Forest {
    fn from(mut blocks: Vec<BlockInstance>) -> Self {
        for block in &mut blocks {
            block.fill_defaults();
        }
        let mut forest = Self {
            blocks,
            next_serial: 1,
        };
        let max_serial = forest
            .walk()
            .filter_map(|(_, inst)| inst.id.serial())
            .max()
            .unwrap_or(0);
        forest.next_serial = max_serial.saturating_add(1);
        forest
    }
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Forest> for Vec<BlockInstance> {
    fn from(forest: Forest) -> Self {
        forest.blocks
    }
}

impl Forest {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_serial: 1,
        }
    }

    pub fn blocks(&self) -> &[BlockInstance] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<BlockInstance> {
        &mut self.blocks
    }

    /// Top-level instances, in stored order.
    pub fn top_level(&self) -> impl Iterator<Item = &BlockInstance> {
        self.blocks.iter().filter(|b| b.parent_id.is_none())
    }

    pub fn find(&self, id: &InstanceId) -> Option<&BlockInstance> {
        self.blocks.iter().find_map(|b| b.find(id))
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.find(id).is_some()
    }

    /// Total number of instances, nested ones included.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(BlockInstance::subtree_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Depth-first pre-order walk yielding `(depth, instance)`.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.blocks.iter().rev().map(|b| (0, b)).collect(),
        }
    }

    /// Fresh id for a new instance of `def`. Never hands out an id that is
    /// already present or was handed out before by this forest.
    pub(crate) fn allocate_id(&mut self, def: &BlockDefinition) -> InstanceId {
        loop {
            let candidate = InstanceId(format!("{}-{}", def.id, self.next_serial));
            self.next_serial = self.next_serial.checked_add(1).unwrap_or(1);
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Checks single ownership, `parentId` consistency, and that only
    /// structural kinds own children.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&InstanceId> = HashSet::new();
        for block in &self.blocks {
            if let Some(parent) = &block.parent_id {
                return Err(ProjectError::InvalidForest(format!(
                    "top-level block '{}' claims parent '{}'",
                    block.id, parent
                )));
            }
            validate_subtree(block, &mut seen)?;
        }
        Ok(())
    }
}

fn validate_subtree<'a>(
    block: &'a BlockInstance,
    seen: &mut HashSet<&'a InstanceId>,
) -> Result<()> {
    if !seen.insert(&block.id) {
        return Err(ProjectError::InvalidForest(format!(
            "block '{}' appears more than once",
            block.id
        )));
    }
    if !block.children.is_empty() && !block.definition.can_own_children() {
        return Err(ProjectError::InvalidForest(format!(
            "block '{}' of kind '{}' cannot contain other blocks",
            block.id,
            block.kind().as_str()
        )));
    }
    for child in &block.children {
        if child.parent_id.as_ref() != Some(&block.id) {
            return Err(ProjectError::InvalidForest(format!(
                "block '{}' is nested in '{}' but its parentId is {}",
                child.id,
                block.id,
                child
                    .parent_id
                    .as_ref()
                    .map(|p| format!("'{}'", p))
                    .unwrap_or_else(|| "unset".to_string())
            )));
        }
        validate_subtree(child, seen)?;
    }
    Ok(())
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a BlockInstance)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a BlockInstance);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, block) = self.stack.pop()?;
        self.stack
            .extend(block.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, block))
    }
}
