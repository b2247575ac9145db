//! Engine configuration.

use std::path::{Path, PathBuf};

/// Configuration values used when resolving and rendering templates.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base directory against which template names are resolved.
    pub templates_dir: PathBuf,
    /// File extension appended to template names that lack one.
    pub template_extension: String,
    /// Whether the final output is re-indented.
    pub indent_output: bool,
    /// Hard limit on nested include/extends chains. Cyclic chains are
    /// otherwise undetectable and would recurse until the stack blows.
    pub max_include_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("."),
            template_extension: "html".to_string(),
            indent_output: true,
            max_include_depth: 32,
        }
    }
}

impl EngineConfig {
    /// Create a configuration rooted at the given templates directory.
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            ..Self::default()
        }
    }

    /// Set the template file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.template_extension = extension.into();
        self
    }

    /// Enable or disable output indentation.
    pub fn with_indent_output(mut self, indent: bool) -> Self {
        self.indent_output = indent;
        self
    }

    /// Set the maximum include/extends depth.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Resolve a template name to a path under the templates directory,
    /// appending the configured extension when missing.
    pub fn resolve_template_path(&self, name: &str) -> PathBuf {
        let suffix = format!(".{}", self.template_extension);
        if name.ends_with(&suffix) || Path::new(name).extension().is_some() {
            self.templates_dir.join(name)
        } else {
            self.templates_dir.join(format!("{name}{suffix}"))
        }
    }
}
