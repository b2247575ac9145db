//! Compile command - render a template into a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::EngineArgs;

#[derive(Args)]
pub struct CompileArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// File the rendered output is written to
    #[arg(short, long)]
    pub out: PathBuf,
}

pub fn execute(args: CompileArgs) -> Result<()> {
    info!(
        "Compiling template {} to {}",
        args.engine.template,
        args.out.display()
    );

    let engine = args.engine.build_engine()?;
    engine
        .compile_file(&args.engine.template, &args.out)
        .with_context(|| format!("compiling template {}", args.engine.template))?;

    println!("Wrote {}", args.out.display());
    Ok(())
}
