use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pyblocks-rs",
    about = "Generate Python source from a block-tree project (or turn Python into blocks)."
)]
pub struct Args {
    #[arg(value_name = "INPUT", help = "Project JSON, .pyblocks bundle, or .py source.")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT", help = "Write generated code here instead of stdout.")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Treat INPUT as Python source regardless of its extension.")]
    pub from_python: bool,

    #[arg(
        long,
        value_name = "COMMANDS",
        help = "Apply a JSON array of edit commands to the forest before generating."
    )]
    pub apply: Option<PathBuf>,

    #[arg(long, help = "Write the (converted or edited) project JSON to this path.")]
    pub emit_project: Option<PathBuf>,

    #[arg(long, help = "Write OUTPUT as a .pyblocks bundle instead of plain Python.")]
    pub bundle: bool,

    #[arg(long, help = "Print code and forest statistics.")]
    pub stats: bool,

    #[arg(long, default_value_t = 4, help = "Spaces per nesting level in generated code.")]
    pub indent_width: usize,
}
