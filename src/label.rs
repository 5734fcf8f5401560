use crate::codegen::render_line;
use crate::forest::BlockInstance;

type LabelFn = fn(&BlockInstance) -> String;

const LABELS: &[(&str, LabelFn)] = &[("print", print_label), ("range", range_label)];

/// Short text shown on a block on the canvas. Defaults to the generated line
/// without its trailing colon.
pub fn display_label(block: &BlockInstance) -> String {
    if let Some((_, label)) = LABELS.iter().find(|(id, _)| *id == block.definition.id) {
        return label(block);
    }
    let line = render_line(block);
    match line.strip_suffix(':') {
        Some(stripped) => stripped.to_string(),
        None => line,
    }
}

fn print_label(block: &BlockInstance) -> String {
    let message = block.param_text("message");
    let message = message
        .strip_prefix(['"', '\''])
        .unwrap_or(&message);
    let message = message
        .strip_suffix(['"', '\''])
        .unwrap_or(message);
    format!("print(\"{}\")", message)
}

fn range_label(block: &BlockInstance) -> String {
    let variable = block.param_text("variable");
    let start = block.param_text("start");
    let stop = block.param_text("stop");
    let step = block.param_text("step");
    if step == "1" {
        format!("{} = range({}, {})", variable, start, stop)
    } else {
        format!("{} = range({}, {}, {})", variable, start, stop, step)
    }
}
