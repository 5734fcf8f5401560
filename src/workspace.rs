use crate::codegen::{self, GenerateOptions};
use crate::error::Result;
use crate::forest::{Forest, InstanceId, Position};
use crate::mutation::{self, Patch};
use serde::{Deserialize, Serialize};

/// One edit request from the presentation layer, in the shape it arrives
/// over JSON (`{"op": "group", "parent": "...", "child": "..."}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Insert {
        block: String,
        #[serde(default)]
        position: Position,
    },
    Update {
        id: InstanceId,
        #[serde(default)]
        patch: Patch,
    },
    Delete {
        id: InstanceId,
    },
    Group {
        parent: InstanceId,
        child: InstanceId,
    },
    Ungroup {
        id: InstanceId,
    },
}

/// Sole owner of the current forest. All edits go through here, one at a
/// time; readers borrow the settled snapshot.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    forest: Forest,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            forest: Forest::new(),
        }
    }

    /// Starts from a loaded or converted forest after checking its shape.
    pub fn from_forest(forest: Forest) -> Result<Self> {
        forest.validate()?;
        Ok(Self { forest })
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn into_forest(self) -> Forest {
        self.forest
    }

    /// Swaps in a whole new forest (project load). The current one is kept
    /// when the new one is malformed.
    pub fn replace(&mut self, forest: Forest) -> Result<()> {
        forest.validate()?;
        self.forest = forest;
        Ok(())
    }

    pub fn insert(&mut self, block: &str, position: Position) -> Option<InstanceId> {
        let (next, id) = mutation::try_insert(&self.forest, block, position)?;
        self.forest = next;
        Some(id)
    }

    pub fn update(&mut self, id: &InstanceId, patch: &Patch) -> bool {
        self.commit(mutation::try_update(&self.forest, id, patch))
    }

    pub fn delete(&mut self, id: &InstanceId) -> bool {
        self.commit(mutation::try_delete(&self.forest, id))
    }

    pub fn group(&mut self, parent: &InstanceId, child: &InstanceId) -> bool {
        self.commit(mutation::try_group(&self.forest, parent, child))
    }

    pub fn ungroup(&mut self, id: &InstanceId) -> bool {
        self.commit(mutation::try_ungroup(&self.forest, id))
    }

    /// Applies `command`; returns whether the forest changed.
    pub fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::Insert { block, position } => self.insert(block, *position).is_some(),
            Command::Update { id, patch } => self.update(id, patch),
            Command::Delete { id } => self.delete(id),
            Command::Group { parent, child } => self.group(parent, child),
            Command::Ungroup { id } => self.ungroup(id),
        }
    }

    /// Applies commands in order; returns how many changed the forest.
    pub fn apply_all<'a, I>(&mut self, commands: I) -> usize
    where
        I: IntoIterator<Item = &'a Command>,
    {
        commands
            .into_iter()
            .filter(|command| self.apply(command))
            .count()
    }

    pub fn generate(&self) -> String {
        codegen::generate(&self.forest)
    }

    pub fn generate_with_options(&self, options: &GenerateOptions) -> String {
        codegen::generate_with_options(&self.forest, options)
    }

    fn commit(&mut self, next: Option<Forest>) -> bool {
        match next {
            Some(forest) => {
                self.forest = forest;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commands_parse_from_tagged_json() {
        let commands: Vec<Command> = serde_json::from_value(json!([
            { "op": "insert", "block": "for", "position": { "x": 0.0, "y": 0.0 } },
            { "op": "insert", "block": "print" },
            { "op": "group", "parent": "for-1", "child": "print-2" },
            { "op": "update", "id": "for-1", "patch": { "collapsed": true } },
            { "op": "delete", "id": "missing-9" }
        ]))
        .unwrap();
        let mut workspace = Workspace::new();
        assert_eq!(workspace.apply_all(&commands), 4);
        assert_eq!(workspace.generate(), "for i in range(5):\n");
    }

    #[test]
    fn replace_keeps_current_forest_on_invalid_input() {
        let mut workspace = Workspace::new();
        workspace.insert("print", Position::default());
        let bad: Forest = serde_json::from_value(json!([
            { "id": "print-7", "block": "print", "parentId": "for-1" }
        ]))
        .unwrap();
        assert!(workspace.replace(bad).is_err());
        assert_eq!(workspace.forest().len(), 1);
    }
}
