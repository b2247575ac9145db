//! The user-facing engine facade.

use std::path::Path;
use std::rc::Rc;

use tracing::info;

use crate::config::EngineConfig;
use crate::data::{DataModel, Value};
use crate::error::EngineResult;
use crate::registry::Registries;
use crate::template::Template;

/// Binds data and configuration to template renders.
///
/// Registries are fixed at construction; a render only ever reads
/// them. Bind values with [`set`](Engine::set), then render by template
/// name or from source text.
pub struct Engine {
    config: EngineConfig,
    registries: Rc<Registries>,
    model: DataModel,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// An engine with the default directive and helper catalogues.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registries(config, Registries::default())
    }

    /// An engine with caller-assembled registries.
    pub fn with_registries(config: EngineConfig, registries: Registries) -> Self {
        Self {
            config,
            registries: Rc::new(registries),
            model: DataModel::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bind a value into the data model shared by subsequent renders.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.model.set(key, value);
    }

    /// Render a template file, resolved by name against the configured
    /// templates directory.
    pub fn render_file(&self, name: &str) -> EngineResult<String> {
        info!(template = name, "rendering template file");
        let mut template = Template::load(
            name,
            self.model.copy(),
            Rc::clone(&self.registries),
            self.config.clone(),
        )?;
        template.output_string()
    }

    /// Render template source text directly.
    pub fn render_string(&self, source: &str) -> EngineResult<String> {
        let mut template = Template::from_string(
            source,
            self.model.copy(),
            Rc::clone(&self.registries),
            self.config.clone(),
        );
        template.output_string()
    }

    /// Render a template file and write the output to a path.
    pub fn compile_file(&self, name: &str, output: &Path) -> EngineResult<()> {
        info!(template = name, output = %output.display(), "compiling template file");
        let mut template = Template::load(
            name,
            self.model.copy(),
            Rc::clone(&self.registries),
            self.config.clone(),
        )?;
        template.output_file(output)
    }

    /// Render template source text and write the output to a path.
    pub fn compile_string(&self, source: &str, output: &Path) -> EngineResult<()> {
        let mut template = Template::from_string(
            source,
            self.model.copy(),
            Rc::clone(&self.registries),
            self.config.clone(),
        );
        template.output_file(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_string_with_bound_data() {
        let mut engine = Engine::new(EngineConfig::default().with_indent_output(false));
        engine.set("who", "world");
        let out = engine
            .render_string("<b:template><p>Hello ${who}</p></b:template>")
            .unwrap();
        assert_eq!(out, "<p>Hello world</p>");
    }

    #[test]
    fn test_renders_share_bound_model_without_mutation() {
        let mut engine = Engine::new(EngineConfig::default().with_indent_output(false));
        engine.set("n", 1i64);
        let source =
            r#"<b:template><b:assign var="n" value="${n} + 1"/><p>${n}</p></b:template>"#;
        assert_eq!(engine.render_string(source).unwrap(), "<p>2</p>");
        // The assign worked on a copy; the engine's model is untouched.
        assert_eq!(engine.render_string(source).unwrap(), "<p>2</p>");
    }
}
