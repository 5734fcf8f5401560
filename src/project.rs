use crate::error::{ProjectError, Result};
use crate::forest::Forest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const UNTITLED: &str = "Untitled";

/// Saved project: a named forest plus bookkeeping. Timestamps serialize as
/// RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub blocks: Forest,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn new(name: &str, description: &str, blocks: Forest) -> Self {
        let now = Utc::now();
        let name = name.trim();
        Self {
            name: if name.is_empty() { UNTITLED } else { name }.to_string(),
            description: description.trim().to_string(),
            blocks,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    /// Parses a saved project. A bare JSON array is taken as the block list
    /// of an untitled project. The forest must pass
    /// [`Forest::validate`].
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let record = if value.is_array() {
            let blocks: Forest = serde_json::from_value(value)?;
            ProjectRecord::new(UNTITLED, "", blocks)
        } else {
            serde_json::from_value::<ProjectRecord>(value)?
        };
        record.blocks.validate()?;
        Ok(record)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Download name used when exporting: whitespace runs become `_`.
    pub fn export_file_name(&self) -> String {
        let stem = self.name.split_whitespace().collect::<Vec<_>>().join("_");
        format!("{}.json", stem)
    }
}

pub fn read_project_file(path: &Path) -> Result<ProjectRecord> {
    let text = fs::read_to_string(path)?;
    ProjectRecord::from_json(&text)
}

/// Writes through a temporary file in the target directory so a failed save
/// never leaves a truncated project behind.
pub fn write_project_file(record: &ProjectRecord, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(record.to_json_pretty()?.as_bytes())?;
    temp.persist(path).map_err(|e| ProjectError::Io(e.error))?;
    log::info!(
        "saved project '{}' ({} blocks) to {}",
        record.name,
        record.blocks.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array_loads_as_untitled_project() {
        let record = ProjectRecord::from_json(r#"[{"id": "print-1", "block": "print"}]"#).unwrap();
        assert_eq!(record.name, "Untitled");
        assert_eq!(record.blocks.len(), 1);
    }

    #[test]
    fn export_name_replaces_whitespace() {
        let record = ProjectRecord::new("  Guessing   Game ", "", Forest::new());
        assert_eq!(record.export_file_name(), "Guessing_Game.json");
    }

    #[test]
    fn timestamps_are_rfc3339_strings() {
        let mut record = ProjectRecord::from_json(
            r#"{"name": "x", "blocks": [], "createdAt": "2024-03-01T12:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(record.created_at.to_rfc3339(), "2024-03-01T12:00:00+00:00");
        record.touch();
        assert!(record.updated_at >= record.created_at);

        let value: Value = serde_json::from_str(&record.to_json_pretty().unwrap()).unwrap();
        let stamp = value["createdAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn largest_possible_id_serial_still_loads() {
        let record =
            ProjectRecord::from_json(r#"[{"id": "print-18446744073709551615", "block": "print"}]"#)
                .unwrap();
        assert_eq!(record.blocks.len(), 1);
    }

    #[test]
    fn structurally_broken_project_is_rejected() {
        let text = r#"{"name": "x", "blocks": [
            {"id": "a-1", "block": "print"},
            {"id": "a-1", "block": "print"}
        ]}"#;
        assert!(matches!(
            ProjectRecord::from_json(text),
            Err(ProjectError::InvalidForest(_))
        ));
    }
}
