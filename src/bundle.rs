use crate::codegen::{self, GenerateOptions};
use crate::error::{ProjectError, Result};
use crate::project::ProjectRecord;
use serde_json::{json, Value};
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipArchive;

const BUNDLE_FORMAT: &str = "pyblocks";
const BUNDLE_VERSION: u64 = 1;
const ENTRY_FILE: &str = "main.py";

/// Exported `.pyblocks` archive: the project plus the source generated
/// from it.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub project: ProjectRecord,
    pub source: String,
}

pub fn write_bundle_file(project: &ProjectRecord, options: &GenerateOptions, output_path: &Path) -> Result<()> {
    let bytes = build_bundle_bytes(project, options)?;
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, bytes)?;
    log::info!("exported '{}' to {}", project.name, output_path.display());
    Ok(())
}

pub fn build_bundle_bytes(project: &ProjectRecord, options: &GenerateOptions) -> Result<Vec<u8>> {
    let source = codegen::generate_with_options(&project.blocks, options);
    let mut out = Cursor::new(Vec::<u8>::new());
    let mut zip = zip::ZipWriter::new(&mut out);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT,
        "version": BUNDLE_VERSION,
        "name": project.name,
        "entry_file": ENTRY_FILE,
        "block_count": project.blocks.len(),
        "source_md5": source_digest(&source),
    });

    zip.start_file("manifest.json", opts)?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

    zip.start_file("project.json", opts)?;
    zip.write_all(project.to_json_pretty()?.as_bytes())?;

    zip.start_file(ENTRY_FILE, opts)?;
    zip.write_all(source.as_bytes())?;

    zip.finish()?;
    Ok(out.into_inner())
}

pub fn read_bundle_file(path: &Path) -> Result<Bundle> {
    let bytes = fs::read(path)?;
    read_bundle_bytes(&bytes)
}

pub fn read_bundle_bytes(bytes: &[u8]) -> Result<Bundle> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| ProjectError::Bundle("input is not a valid .pyblocks archive".to_string()))?;

    let manifest_text = read_zip_entry_text(&mut zip, "manifest.json")?;
    let manifest: Value = serde_json::from_str(&manifest_text)?;
    let format = manifest
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if format != BUNDLE_FORMAT {
        return Err(ProjectError::Bundle(format!("unknown archive format '{}'", format)));
    }
    let version = manifest
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or_default();
    if version != BUNDLE_VERSION {
        return Err(ProjectError::Bundle(format!(
            "unsupported version {} (expected {})",
            version, BUNDLE_VERSION
        )));
    }
    let entry_file = manifest
        .get("entry_file")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(ENTRY_FILE)
        .to_string();

    let project = ProjectRecord::from_json(&read_zip_entry_text(&mut zip, "project.json")?)?;
    let source = read_zip_entry_text(&mut zip, &entry_file)?;

    if let Some(expected) = manifest.get("source_md5").and_then(Value::as_str) {
        let actual = source_digest(&source);
        if actual != expected {
            return Err(ProjectError::Bundle(format!(
                "'{}' does not match its manifest checksum",
                entry_file
            )));
        }
    }

    Ok(Bundle { project, source })
}

fn read_zip_entry_text<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut entry = zip
        .by_name(name)
        .map_err(|_| ProjectError::Bundle(format!("missing '{}' in archive", name)))?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}

fn source_digest(source: &str) -> String {
    format!("{:x}", md5::compute(source.as_bytes()))
}
