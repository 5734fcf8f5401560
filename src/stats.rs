use crate::forest::Forest;
use serde::Serialize;

/// Line counts over generated source, blank lines excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CodeStats {
    pub total_lines: usize,
    pub functions: usize,
    pub classes: usize,
    pub loops: usize,
    pub conditionals: usize,
    pub imports: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForestStats {
    pub blocks: usize,
    pub top_level: usize,
    pub max_depth: usize,
    pub collapsed: usize,
}

/// How many non-blank lines after a `while True:` are searched for a `break`.
const BREAK_LOOKAHEAD: usize = 9;

pub fn code_stats(code: &str) -> CodeStats {
    let mut stats = CodeStats::default();
    for line in code.lines().map(str::trim).filter(|l| !l.is_empty()) {
        stats.total_lines += 1;
        if line.starts_with("def ") {
            stats.functions += 1;
        }
        if line.starts_with("class ") {
            stats.classes += 1;
        }
        if line.starts_with("for ") || line.starts_with("while ") {
            stats.loops += 1;
        }
        if line.starts_with("if ") || line.starts_with("elif ") {
            stats.conditionals += 1;
        }
        if line.starts_with("import ") || line.starts_with("from ") {
            stats.imports += 1;
        }
    }
    stats
}

pub fn forest_stats(forest: &Forest) -> ForestStats {
    let mut stats = ForestStats {
        top_level: forest.blocks().len(),
        ..ForestStats::default()
    };
    for (depth, block) in forest.walk() {
        stats.blocks += 1;
        stats.max_depth = stats.max_depth.max(depth + 1);
        if block.collapsed {
            stats.collapsed += 1;
        }
    }
    stats
}

/// Cheap textual warnings: `while True:` with no nearby `break`, and a
/// literal division by zero. Line numbers count non-blank lines from 1.
pub fn potential_issues(code: &str) -> Vec<String> {
    let lines: Vec<&str> = code.lines().filter(|l| !l.trim().is_empty()).collect();
    let mut issues = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("while True:") {
            let has_break = lines
                .iter()
                .skip(index + 1)
                .take(BREAK_LOOKAHEAD)
                .any(|l| l.contains("break"));
            if !has_break {
                issues.push(format!("Line {}: Potential infinite loop detected", index + 1));
            }
        }
        if trimmed.contains("/ 0") || trimmed.contains("/0") {
            issues.push(format!("Line {}: Division by zero detected", index + 1));
        }
    }
    issues
}
