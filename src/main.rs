use anyhow::Result;
use clap::Parser;
use pyblocks_core::cli::Args;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    pyblocks_core::run_cli(&args)
}
