//! One document's trip through the rendering pipeline.
//!
//! The pipeline runs stages in order: inheritance merge, Include,
//! PreParse, data population, PostParse. Token stages are fixed-point
//! rewrite loops: each pass re-parses the serialized document,
//! rediscovers directives, discharges exactly one token (the
//! undischarged token with the lowest priority value, the
//! iterate-collection directive first among equals), applies its edit,
//! and re-serializes. A stage is done when discovery finds nothing for
//! it — expansion can introduce new directives, and only rediscovery
//! guarantees they are seen.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::data::{DataModel, DataResolver};
use crate::error::{EngineError, EngineResult};
use crate::extender;
use crate::indent;
use crate::populate;
use crate::registry::Registries;
use crate::tokenizer::{self, DiscoveredToken};
use crate::tokens::{RenderContext, Stage, TokenOutput};
use crate::util::restore_entities;
use crate::xml::Document;

/// A template bound to one data-model generation.
pub struct Template {
    config: EngineConfig,
    registries: Rc<Registries>,
    resolver: DataResolver,
    text: String,
    parsed: bool,
    include_depth: usize,
}

impl Template {
    /// Build a template from source text.
    pub fn from_string(
        source: impl Into<String>,
        model: DataModel,
        registries: Rc<Registries>,
        config: EngineConfig,
    ) -> Self {
        Self {
            config,
            registries,
            resolver: DataResolver::new(model),
            text: source.into(),
            parsed: false,
            include_depth: 0,
        }
    }

    /// Build a template from a file. Used directly by includes, which
    /// carry their nesting depth.
    pub(crate) fn from_file(
        path: &Path,
        model: DataModel,
        registries: Rc<Registries>,
        config: EngineConfig,
        include_depth: usize,
    ) -> EngineResult<Self> {
        let source = fs::read_to_string(path)
            .map_err(|_| EngineError::TemplateNotFound(path.to_path_buf()))?;
        let mut template = Self::from_string(source, model, registries, config);
        template.include_depth = include_depth;
        Ok(template)
    }

    /// Load a template by name through the configured base directory.
    pub fn load(
        name: &str,
        model: DataModel,
        registries: Rc<Registries>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        let path = config.resolve_template_path(name);
        Self::from_file(&path, model, registries, config, 0)
    }

    /// Replace the bound data model, starting a fresh resolver
    /// generation (and cache) in lockstep.
    pub fn set_model(&mut self, model: DataModel) {
        self.resolver = DataResolver::new(model);
    }

    /// Run the pipeline to completion. Idempotent: a second call is a
    /// no-op and the rendered text is reused.
    pub fn parse(&mut self) -> EngineResult<()> {
        if self.parsed {
            return Ok(());
        }

        self.text = extender::resolve_inheritance(&self.text, &self.config)?;
        self.run_stage(Stage::Include)?;
        self.run_stage(Stage::PreParse)?;
        self.text = populate::populate_text(
            &self.text,
            &self.resolver,
            &self.registries.functions,
        )?;
        self.run_stage(Stage::PostParse)?;

        self.parsed = true;
        Ok(())
    }

    /// Render and serialize the sentinel root's children, entity
    /// markers still in their parsed form. Includes splice this into
    /// the parent document, which restores entities at its own end.
    pub(crate) fn render_markup(&mut self) -> EngineResult<String> {
        self.parse()?;
        let doc = Document::parse(&self.text)?;
        let mut out = String::new();
        if let Some(doctype) = &doc.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push_str(">\n");
        }
        out.push_str(&doc.root.inner_markup());
        Ok(out)
    }

    /// The final output: rendered markup with entity references
    /// restored and, when configured, re-indented.
    pub fn output_string(&mut self) -> EngineResult<String> {
        let markup = restore_entities(&self.render_markup()?);
        if self.config.indent_output {
            Ok(indent::indent(&markup))
        } else {
            Ok(markup)
        }
    }

    /// Render to a file.
    pub fn output_file(&mut self, path: &Path) -> EngineResult<()> {
        let output = self.output_string()?;
        fs::write(path, output)?;
        Ok(())
    }

    fn run_stage(&mut self, stage: Stage) -> EngineResult<()> {
        loop {
            let mut doc = Document::parse(&self.text)?;
            let mut discovered = tokenizer::tokenize(&doc, &self.registries)?;

            let Some(index) = select_token(&discovered, stage) else {
                return Ok(());
            };
            let DiscoveredToken { mut token, path } = discovered.swap_remove(index);
            debug!(stage = ?stage, token = token.name(), ?path, "discharging directive");

            token.parse()?;
            let mut ctx = RenderContext {
                config: &self.config,
                registries: &self.registries,
                resolver: &self.resolver,
                include_depth: self.include_depth,
                pending_model: None,
            };
            let output = token.render(&mut ctx)?;
            let pending_model = ctx.pending_model.take();
            drop(ctx);

            match output {
                TokenOutput::Remove => doc.remove_node(&path)?,
                TokenOutput::Replace(node) => doc.replace_node(&path, node)?,
                TokenOutput::Splice(nodes) => doc.splice_node(&path, nodes)?,
            }
            if let Some(model) = pending_model {
                self.set_model(model);
            }
            self.text = doc.serialize();
        }
    }
}

/// Pick the token to discharge this pass: lowest priority value in the
/// active stage, the iterate-collection directive first among equal
/// priorities, discovery order after that. Discovery runs bottom-up,
/// so among several iterate directives the last-discovered one is the
/// outermost; it must expand first so the copies it makes of inner
/// loops carry rewritten queries before they are discharged.
fn select_token(discovered: &[DiscoveredToken], stage: Stage) -> Option<usize> {
    discovered
        .iter()
        .enumerate()
        .filter(|(_, d)| d.token.stage().runs_in(stage))
        .min_by_key(|(index, d)| {
            let iterates = d.token.name() == crate::tokens::foreach::NAME;
            let order = if iterates { usize::MAX - *index } else { *index };
            (d.token.priority(), !iterates, order)
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn render(source: &str, model: DataModel) -> EngineResult<String> {
        let registries = Rc::new(Registries::default());
        let config = EngineConfig::default().with_indent_output(false);
        let mut template = Template::from_string(source, model, registries, config);
        template.output_string()
    }

    #[test]
    fn test_plain_interpolation() {
        let mut model = DataModel::new();
        model.set("name", "Ann");
        let out = render("<b:template><p>${name}</p></b:template>", model).unwrap();
        assert_eq!(out, "<p>Ann</p>");
    }

    #[test]
    fn test_foreach_expansion() {
        let mut model = DataModel::new();
        model.set("tags", Value::from(vec!["a", "b"]));
        let out = render(
            r#"<b:template><ul><b:foreach value="${tags}" var="t"><li>${t}</li></b:foreach></ul></b:template>"#,
            model,
        )
        .unwrap();
        assert_eq!(out, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_condition_without_else_renders_nothing() {
        let out = render(
            r#"<b:template><b:condition><if condition="1 == 2"><p>no</p></if></b:condition></b:template>"#,
            DataModel::new(),
        )
        .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_set_model_replaces_bindings_before_rendering() {
        let mut model = DataModel::new();
        model.set("n", Value::Int(1));
        let registries = Rc::new(Registries::default());
        let config = EngineConfig::default().with_indent_output(false);
        let mut template = Template::from_string(
            "<b:template><p>${n}</p></b:template>",
            model,
            registries,
            config,
        );

        let mut rebound = DataModel::new();
        rebound.set("n", Value::Int(2));
        template.set_model(rebound);
        assert_eq!(template.output_string().unwrap(), "<p>2</p>");
    }

    #[test]
    fn test_assign_rebinding_discards_cached_resolution() {
        let mut model = DataModel::new();
        model.set("n", Value::Int(1));
        // The assign expression resolves `n` (caching it in the current
        // generation) and then rebinds it; the later substitution must
        // see the new generation's value.
        let out = render(
            r#"<b:template><b:assign var="n" value="${n} + 10"/><p>${n}</p></b:template>"#,
            model,
        )
        .unwrap();
        assert_eq!(out, "<p>11</p>");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let mut model = DataModel::new();
        model.set("n", Value::Int(1));
        let registries = Rc::new(Registries::default());
        let config = EngineConfig::default().with_indent_output(false);
        let mut template = Template::from_string(
            "<b:template><p>${n}</p></b:template>",
            model,
            registries,
            config,
        );
        template.parse().unwrap();
        let first = template.output_string().unwrap();
        template.parse().unwrap();
        assert_eq!(template.output_string().unwrap(), first);
    }
}
