pub mod bundle;
pub mod catalog;
pub mod codegen;
pub mod convert;
pub mod error;
pub mod forest;
pub mod label;
pub mod mutation;
pub mod project;
pub mod stats;
pub mod workspace;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

use anyhow::{Context, Result};
use codegen::GenerateOptions;
use project::ProjectRecord;
use std::path::{Path, PathBuf};
use workspace::{Command, Workspace};

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    if args.bundle && args.output.is_none() {
        anyhow::bail!("--bundle requires an OUTPUT path.");
    }
    if args.indent_width == 0 {
        anyhow::bail!("--indent-width must be at least 1.");
    }

    let total_stages = 2
        + usize::from(args.apply.is_some())
        + usize::from(args.emit_project.is_some())
        + usize::from(args.output.is_some());
    let progress = CliProgress::new("Generate", total_stages);
    let mut stage = 0usize;

    stage += 1;
    progress.emit(stage, "Loading input");
    let input = canonicalize_file(&args.input)?;
    let mut record = load_project(&input, args.from_python)?;

    if let Some(commands_path) = &args.apply {
        stage += 1;
        progress.emit(stage, "Applying edit commands");
        let text = std::fs::read_to_string(commands_path)
            .with_context(|| format!("Failed to read '{}'.", commands_path.display()))?;
        let commands: Vec<Command> = serde_json::from_str(&text)
            .with_context(|| format!("'{}' is not a JSON array of commands.", commands_path.display()))?;
        let mut workspace = Workspace::from_forest(record.blocks)?;
        let changed = workspace.apply_all(&commands);
        eprintln!("{} of {} commands changed the forest.", changed, commands.len());
        record.blocks = workspace.into_forest();
        record.touch();
    }

    stage += 1;
    progress.emit(stage, "Generating Python");
    let options = GenerateOptions {
        indent_width: args.indent_width,
        ..GenerateOptions::default()
    };
    let code = codegen::generate_with_options(&record.blocks, &options);

    if let Some(project_path) = &args.emit_project {
        stage += 1;
        progress.emit(stage, "Writing project JSON");
        project::write_project_file(&record, project_path)?;
    }

    match &args.output {
        Some(output) => {
            stage += 1;
            if args.bundle || has_extension(output, "pyblocks") {
                progress.emit(stage, "Writing .pyblocks bundle");
                bundle::write_bundle_file(&record, &options, output)?;
            } else {
                progress.emit(stage, "Writing Python source");
                std::fs::write(output, code.as_bytes())
                    .with_context(|| format!("Failed to write '{}'.", output.display()))?;
            }
        }
        None => print!("{}", code),
    }

    if args.stats {
        print_stats(&record, &code);
    }

    Ok(())
}

/// Reads a project from disk: `.py` is converted, `.pyblocks` is unpacked,
/// anything else is parsed as project JSON.
pub fn load_project(path: &Path, from_python: bool) -> Result<ProjectRecord> {
    if from_python || has_extension(path, "py") {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'.", path.display()))?;
        let conversion = convert::python_to_forest(&source)?;
        for issue in &conversion.issues {
            eprintln!("warning: line {}: {}", issue.line, issue.message);
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(ProjectRecord::new(&name, "", conversion.forest));
    }
    if has_extension(path, "pyblocks") {
        let bundle = bundle::read_bundle_file(path)
            .with_context(|| format!("Failed to read bundle '{}'.", path.display()))?;
        return Ok(bundle.project);
    }
    project::read_project_file(path).with_context(|| format!("Failed to load project '{}'.", path.display()))
}

/// Generates code for a project JSON document (object or bare array).
pub fn generate_from_json(text: &str, options: &GenerateOptions) -> Result<String> {
    let record = ProjectRecord::from_json(text)?;
    Ok(codegen::generate_with_options(&record.blocks, options))
}

pub fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!("Input file not found: '{}'.", path.display()));
    }
    Ok(path.canonicalize()?)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(not(target_arch = "wasm32"))]
fn print_stats(record: &ProjectRecord, code: &str) {
    let code_stats = stats::code_stats(code);
    let forest_stats = stats::forest_stats(&record.blocks);
    println!("-- {} --", record.name);
    println!(
        "blocks: {} ({} top-level, {} collapsed), max depth {}",
        forest_stats.blocks, forest_stats.top_level, forest_stats.collapsed, forest_stats.max_depth
    );
    println!(
        "lines: {}, functions: {}, classes: {}, loops: {}, conditionals: {}, imports: {}",
        code_stats.total_lines,
        code_stats.functions,
        code_stats.classes,
        code_stats.loops,
        code_stats.conditionals,
        code_stats.imports
    );
    for issue in stats::potential_issues(code) {
        println!("warning: {}", issue);
    }
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!("[{}] {}... ({}/{}) {}", self.prefix, label, step, self.total, bar);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '=' } else { '-' });
    }
    s.push(']');
    s
}
