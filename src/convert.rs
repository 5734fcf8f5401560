//! Best-effort Python text to blocks. Each line is matched against a fixed
//! list of patterns; indentation decides nesting. This is not a parser: a
//! line nothing matches becomes a comment block holding `Unparsed: <line>`.

use crate::catalog::{self, BlockDefinition, BlockKind};
use crate::error::Result;
use crate::forest::{BlockInstance, Forest, InstanceId, ParamValue, Position};
use regex::Regex;

const ORIGIN_X: f64 = 50.0;
const ORIGIN_Y: f64 = 50.0;
const INDENT_STEP_X: f64 = 30.0;
const ROW_STEP_Y: f64 = 80.0;
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionIssue {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub forest: Forest,
    pub issues: Vec<ConversionIssue>,
}

/// Capture group `n` of `regex` fills parameter `params[n - 1]` of `block`.
struct LinePattern {
    regex: Regex,
    block: &'static str,
    params: &'static [&'static str],
}

const PATTERNS: &[(&str, &str, &[&str])] = &[
    (r"^import\s+([\w.]+)(?:\s+as\s+(\w+))?$", "import", &["library", "alias"]),
    (r"^from\s+([\w.]+)\s+import\s+.+$", "import", &["library"]),
    (r"^class\s+(\w+)(?:\(([^)]*)\))?\s*:$", "class", &["name", "parent"]),
    (r"^def\s+(\w+)\s*\(([^)]*)\)\s*(?:->\s*[^:]+)?:$", "function", &["name", "params"]),
    (r"^if\s+(.+):$", "if", &["condition"]),
    (r"^elif\s+(.+):$", "elif", &["condition"]),
    (r"^else\s*:$", "else", &[]),
    (r"^for\s+(.+?)\s+in\s+(.+):$", "for", &["variable", "range"]),
    (r"^while\s+(.+):$", "while", &["condition"]),
    (r"^match\s+(.+):$", "match", &["value"]),
    (r"^case\s+_\s*:$", "case_default", &[]),
    (r"^case\s+(.+):$", "case", &["pattern"]),
    (r"^try\s*:$", "try", &[]),
    (r"^except(?:\s+([^:]+?))?(?:\s+as\s+(\w+))?\s*:$", "except", &["exception", "variable"]),
    (r"^finally\s*:$", "finally", &[]),
    (r"^raise\s+(.+)$", "raise", &["exception"]),
    (r"^return(?:\s+(.+))?$", "return", &["value"]),
    (r"^break$", "break", &[]),
    (r"^continue$", "continue", &[]),
    (r"^print\((.*)\)$", "print", &["message"]),
    (r"^#\s?(.*)$", "comment", &["text"]),
    (r#"^(\w+)\s*=\s*input\("(.*)"\)$"#, "input", &["variable", "prompt"]),
    (r"^(\w+)\s*=\s*len\((.+)\)$", "len", &["variable", "object"]),
    (
        r"^(\w+)\s*=\s*range\(([^,()]+),\s*([^,()]+),\s*([^,()]+)\)$",
        "range",
        &["variable", "start", "stop", "step"],
    ),
    (r"^(\w+)\s*=\s*range\(([^,()]+),\s*([^,()]+)\)$", "range", &["variable", "start", "stop"]),
    (r"^(\w+)\s*=\s*\[(.*)\]$", "list", &["name", "items"]),
    (r"^(\w+)\s*=\s*\{(.*)\}$", "dict", &["name", "items"]),
    (r"^(\w+)\s*=\s*([A-Z]\w*)\((.*)\)$", "instantiate", &["variable", "class_name", "args"]),
    (r"^(\w+)\.(\w+)\s*=\s*([^=].*)$", "attribute", &["object", "name", "value"]),
    (r"^(\w+)\s*=\s*([^=].*)$", "variable", &["name", "value"]),
    (r"^(\w+)\.(\w+)\((.*)\)$", "method_call", &["object", "method", "args"]),
];

struct LineMatcher {
    patterns: Vec<LinePattern>,
}

impl LineMatcher {
    fn new() -> Result<Self> {
        let mut patterns = Vec::with_capacity(PATTERNS.len());
        for &(source, block, params) in PATTERNS {
            patterns.push(LinePattern {
                regex: Regex::new(source)?,
                block,
                params,
            });
        }
        Ok(Self { patterns })
    }

    /// Block id and captured parameters for a trimmed line.
    fn match_line<'a>(&self, line: &'a str) -> Option<(&'static str, Vec<(&'static str, &'a str)>)> {
        self.patterns.iter().find_map(|pattern| {
            let caps = pattern.regex.captures(line)?;
            let values = pattern
                .params
                .iter()
                .enumerate()
                .filter_map(|(i, name)| caps.get(i + 1).map(|m| (*name, m.as_str().trim())))
                .collect();
            Some((pattern.block, values))
        })
    }
}

pub fn python_to_forest(source: &str) -> Result<Conversion> {
    let matcher = LineMatcher::new()?;
    let mut issues = Vec::new();
    let mut roots: Vec<BlockInstance> = Vec::new();
    let mut open: Vec<(usize, BlockInstance)> = Vec::new();
    let mut row = 0usize;

    for (index, raw_line) in source.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;
        let indent = indent_width(raw_line);
        close_blocks(&mut open, &mut roots, indent);

        let inside_class = open
            .last()
            .is_some_and(|(_, parent)| parent.kind() == BlockKind::Class);
        let (block_id, params, unparsed) = match matcher.match_line(line) {
            Some(("function", params)) if inside_class => ("method", params, false),
            Some((block_id, params)) => (block_id, params, false),
            None => {
                log::warn!("line {} not recognised, kept as comment: {}", line_no, line);
                issues.push(ConversionIssue {
                    line: line_no,
                    message: format!("Unrecognised statement kept as comment: {}", line),
                });
                ("comment", vec![("text", line)], true)
            }
        };
        let Some(definition) = catalog::lookup(block_id) else {
            continue;
        };

        row += 1;
        let position = Position::new(
            ORIGIN_X + indent as f64 * INDENT_STEP_X,
            ORIGIN_Y + (row - 1) as f64 * ROW_STEP_Y,
        );
        let mut block = new_block(definition, row, position);
        for (name, value) in params {
            let value = if unparsed {
                format!("Unparsed: {}", value)
            } else {
                value.to_string()
            };
            block.parameters.insert(name.to_string(), ParamValue::from(value));
        }

        if block.definition.can_own_children() {
            open.push((indent, block));
        } else {
            attach(&mut open, &mut roots, block);
        }
    }
    close_blocks(&mut open, &mut roots, 0);

    Ok(Conversion {
        forest: Forest::from(roots),
        issues,
    })
}

fn new_block(definition: &'static BlockDefinition, serial: usize, position: Position) -> BlockInstance {
    let id = InstanceId::from(format!("{}-{}", definition.id, serial));
    BlockInstance::new(id, definition, position)
}

/// Finishes every open block indented at or beyond `indent`.
fn close_blocks(open: &mut Vec<(usize, BlockInstance)>, roots: &mut Vec<BlockInstance>, indent: usize) {
    while let Some(&(top_indent, _)) = open.last() {
        if top_indent < indent {
            break;
        }
        let Some((_, block)) = open.pop() else {
            break;
        };
        attach(open, roots, block);
    }
}

fn attach(open: &mut [(usize, BlockInstance)], roots: &mut Vec<BlockInstance>, mut block: BlockInstance) {
    match open.last_mut() {
        Some((_, parent)) => {
            block.parent_id = Some(parent.id.clone());
            parent.children.push(block);
        }
        None => {
            block.parent_id = None;
            roots.push(block);
        }
    }
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles_and_names_a_catalog_block() {
        let matcher = LineMatcher::new().unwrap();
        for pattern in &matcher.patterns {
            let definition = catalog::lookup(pattern.block).unwrap();
            for name in pattern.params {
                assert!(definition.param_spec(name).is_some(), "{}.{}", pattern.block, name);
            }
        }
    }

    #[test]
    fn equality_test_is_not_an_assignment() {
        let matcher = LineMatcher::new().unwrap();
        assert!(matcher.match_line("x == 5").is_none());
        assert_eq!(matcher.match_line("x = 5").map(|(id, _)| id), Some("variable"));
    }

    #[test]
    fn tabs_count_as_four_columns() {
        assert_eq!(indent_width("\tx"), 4);
        assert_eq!(indent_width("  x"), 2);
    }
}
