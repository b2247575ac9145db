//! CLI command definitions.
//!
//! Each subcommand maps to one facade operation of the engine: render
//! a template to stdout or a file, or compile it straight to a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use froth_engine::{Engine, EngineConfig, Value};

pub mod compile;
pub mod render;

/// froth - XML directive template engine
#[derive(Parser)]
#[command(name = "froth")]
#[command(version, about = "froth - XML directive template engine")]
#[command(long_about = r#"
froth renders XML templates carrying b:* directive elements against a
JSON data model.

COMMANDS:
  render   → Render a template and print the result
  compile  → Render a template straight into an output file

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Data binding error
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a template and print the result
    Render(render::RenderArgs),

    /// Render a template into an output file
    Compile(compile::CompileArgs),
}

/// Options shared by every rendering subcommand.
#[derive(Args)]
pub struct EngineArgs {
    /// Template name, resolved against the templates directory
    pub template: String,

    /// Directory template names are resolved against
    #[arg(short = 'd', long, default_value = ".")]
    pub templates_dir: PathBuf,

    /// Template file extension
    #[arg(long, default_value = "html")]
    pub extension: String,

    /// JSON file bound as the data model (top-level keys become names)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Extra string bindings, as key=value
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Emit the output without re-indentation
    #[arg(long)]
    pub no_indent: bool,
}

impl EngineArgs {
    /// Build an engine with the requested configuration and bindings.
    pub fn build_engine(&self) -> Result<Engine> {
        let config = EngineConfig::new(&self.templates_dir)
            .with_extension(&self.extension)
            .with_indent_output(!self.no_indent);
        let mut engine = Engine::new(config);

        if let Some(path) = &self.data {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading data file {}", path.display()))?;
            let json: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing data file {}", path.display()))?;
            let serde_json::Value::Object(entries) = json else {
                anyhow::bail!("the data file must hold a JSON object at the top level");
            };
            for (key, value) in entries {
                engine.set(key, Value::from(value));
            }
        }

        for binding in &self.set {
            let (key, value) = binding
                .split_once('=')
                .context("bindings must have the form key=value")?;
            engine.set(key, value);
        }

        Ok(engine)
    }
}
