use crate::catalog;
use crate::forest::{BlockInstance, Forest, Position};
use std::cmp::Ordering;

pub const EMPTY_PLACEHOLDER: &str = "# Your generated Python code will appear here";
const DEFAULT_INDENT_WIDTH: usize = 4;
const DEFAULT_ROW_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Blocks whose `y` differ by less than this sit on the same row and are
    /// ordered by `x`.
    pub row_threshold: f64,
    /// Returned instead of an empty string for a forest with no blocks.
    pub placeholder: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            row_threshold: DEFAULT_ROW_THRESHOLD,
            placeholder: EMPTY_PLACEHOLDER.to_string(),
        }
    }
}

pub fn generate(forest: &Forest) -> String {
    generate_with_options(forest, &GenerateOptions::default())
}

/// Python source for the whole forest: imports, then classes, then
/// functions, then everything else, one blank line between non-empty
/// groups. Pure; the same forest always yields the same bytes.
pub fn generate_with_options(forest: &Forest, options: &GenerateOptions) -> String {
    let mut buckets: [Vec<&BlockInstance>; 4] = Default::default();
    for block in forest.top_level() {
        buckets[block.kind().bucket() as usize].push(block);
    }

    let mut out = String::new();
    let mut wrote_bucket = false;
    for bucket in buckets.iter_mut() {
        if bucket.is_empty() {
            continue;
        }
        sort_by_position(bucket, options.row_threshold);
        if wrote_bucket {
            out.push('\n');
        }
        for block in bucket.iter() {
            render_instance(block, 0, options, &mut out);
        }
        wrote_bucket = true;
    }

    if out.is_empty() {
        return options.placeholder.clone();
    }
    out
}

/// Canvas order: by `y`, unless both blocks share a row, then by `x`.
pub fn compare_positions(a: &Position, b: &Position, row_threshold: f64) -> Ordering {
    if (a.y - b.y).abs() < row_threshold {
        a.x.total_cmp(&b.x)
    } else {
        a.y.total_cmp(&b.y)
    }
}

/// Stable sort under [`compare_positions`]. The row rule is not transitive,
/// so this is a plain insertion sort rather than `slice::sort_by`, which may
/// panic on inconsistent orderings.
pub fn sort_by_position(blocks: &mut [&BlockInstance], row_threshold: f64) {
    for i in 1..blocks.len() {
        let mut j = i;
        while j > 0
            && compare_positions(&blocks[j - 1].position, &blocks[j].position, row_threshold)
                == Ordering::Greater
        {
            blocks.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn render_instance(block: &BlockInstance, depth: usize, options: &GenerateOptions, out: &mut String) {
    out.push_str(&" ".repeat(depth * options.indent_width));
    out.push_str(&render_line(block));
    out.push('\n');

    if block.collapsed || block.children.is_empty() {
        return;
    }
    let mut children: Vec<&BlockInstance> = block.children.iter().collect();
    sort_by_position(&mut children, options.row_threshold);
    for child in children {
        render_instance(child, depth + 1, options, out);
    }
}

/// The block's own statement line, without indentation or children.
pub fn render_line(block: &BlockInstance) -> String {
    let definition = block.definition.definition();
    substitute(definition.template, |name| {
        let spec = definition.param_spec(name)?;
        let Some(value) = block.param(spec.name) else {
            return Some(String::new());
        };
        let raw = value.to_string();
        Some(match catalog::formatter_for(definition, spec.name) {
            Some(format) => format(&raw),
            None => raw,
        })
    })
}

/// Replaces each `{name}` for which `lookup` returns a value. Anything else,
/// including stray braces, is copied through. Substituted text is never
/// rescanned.
fn substitute<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if name_len > 0 && after[name_len..].starts_with('}') {
            if let Some(value) = lookup(&after[..name_len]) {
                out.push_str(&value);
                rest = &after[name_len + 1..];
                continue;
            }
        }
        out.push('{');
        rest = after;
    }
    out.push_str(rest);
    out
}
