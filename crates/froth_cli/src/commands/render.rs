//! Render command - render a template and print it.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::EngineArgs;

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    info!("Rendering template: {}", args.engine.template);

    let engine = args.engine.build_engine()?;
    let output = engine
        .render_file(&args.engine.template)
        .with_context(|| format!("rendering template {}", args.engine.template))?;

    println!("{output}");
    Ok(())
}
