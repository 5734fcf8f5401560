use crate::codegen::GenerateOptions;
use crate::forest::{InstanceId, Position};
use crate::workspace::{Command, Workspace};
use wasm_bindgen::prelude::*;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub fn generate_from_json(project_json: &str) -> Result<String, JsValue> {
    crate::generate_from_json(project_json, &GenerateOptions::default()).map_err(js_error)
}

/// Converts Python text to a JSON block list.
#[wasm_bindgen]
pub fn convert_python(source: &str) -> Result<String, JsValue> {
    let conversion = crate::convert::python_to_forest(source).map_err(js_error)?;
    serde_json::to_string(&conversion.forest).map_err(js_error)
}

/// Browser-side handle on a [`Workspace`]. Edits return whether they took
/// effect; the current forest and code are read back as strings.
#[wasm_bindgen]
pub struct BlockWorkspace {
    inner: Workspace,
}

#[wasm_bindgen]
impl BlockWorkspace {
    #[wasm_bindgen(constructor)]
    pub fn new() -> BlockWorkspace {
        BlockWorkspace {
            inner: Workspace::new(),
        }
    }

    pub fn load(&mut self, project_json: &str) -> Result<(), JsValue> {
        let record = crate::project::ProjectRecord::from_json(project_json).map_err(js_error)?;
        self.inner.replace(record.blocks).map_err(js_error)
    }

    pub fn insert(&mut self, block: &str, x: f64, y: f64) -> Option<String> {
        self.inner
            .insert(block, Position::new(x, y))
            .map(|id| id.to_string())
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.inner.delete(&InstanceId::from(id))
    }

    pub fn group(&mut self, parent: &str, child: &str) -> bool {
        self.inner.group(&InstanceId::from(parent), &InstanceId::from(child))
    }

    pub fn ungroup(&mut self, id: &str) -> bool {
        self.inner.ungroup(&InstanceId::from(id))
    }

    /// Applies one JSON-encoded command such as
    /// `{"op": "update", "id": "print-1", "patch": {"parameters": {"message": "hi"}}}`.
    pub fn apply(&mut self, command_json: &str) -> Result<bool, JsValue> {
        let command: Command = serde_json::from_str(command_json).map_err(js_error)?;
        Ok(self.inner.apply(&command))
    }

    /// Canvas caption for block `id`, or `undefined` when it does not exist.
    pub fn label(&self, id: &str) -> Option<String> {
        self.inner
            .forest()
            .find(&InstanceId::from(id))
            .map(crate::label::display_label)
    }

    pub fn forest_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.inner.forest()).map_err(js_error)
    }

    pub fn code(&self) -> String {
        self.inner.generate()
    }
}

impl Default for BlockWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
