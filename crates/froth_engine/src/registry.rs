//! Registries wiring directive names, namespace prefixes, and helper
//! functions to the engine.
//!
//! Registries are plain values owned by the [`Engine`](crate::Engine),
//! built once before the first render and passed by reference from then
//! on. Nothing here is process-global.

use std::collections::HashMap;

use crate::functions::FunctionRegistry;
use crate::tokens::{self, Token, TokenFactory};
use crate::xml::Element;

/// The reserved namespace URI directive elements belong to.
pub const DIRECTIVE_NAMESPACE_URI: &str = "https://froth.dev/schema/template";

/// The default directive namespace prefix.
pub const DEFAULT_PREFIX: &str = "b";

/// The local name of the required root sentinel element.
pub const ROOT_LOCAL_NAME: &str = "template";

/// Maps directive local names to token constructors.
pub struct TokenRegistry {
    factories: HashMap<String, TokenFactory>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("include", tokens::include::create);
        registry.register("assign", tokens::assign::create);
        registry.register("foreach", tokens::foreach::create);
        registry.register("for", tokens::for_loop::create);
        registry.register("text", tokens::text::create);
        registry.register("condition", tokens::condition::create);
        registry.register("dataTable", tokens::data_table::create);
        registry.register("selectItems", tokens::select_items::create);
        registry.register("fragment", tokens::fragment::create);
        registry.register("block", tokens::block::create);
        registry
    }
}

impl TokenRegistry {
    /// A registry with no directives at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a directive under its local name.
    pub fn register(&mut self, name: impl Into<String>, factory: TokenFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Whether a directive is registered under this local name.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiate the directive handler bound to an element.
    pub fn instantiate(&self, name: &str, element: Element) -> Option<Box<dyn Token>> {
        self.factories.get(name).map(|factory| factory(element))
    }
}

/// Maps directive namespace prefixes to their URI.
pub struct NamespaceRegistry {
    prefixes: HashMap<String, String>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        let mut registry = Self {
            prefixes: HashMap::new(),
        };
        registry.register(DEFAULT_PREFIX, DIRECTIVE_NAMESPACE_URI);
        registry
    }
}

impl NamespaceRegistry {
    /// Bind a prefix to a namespace URI.
    pub fn register(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), uri.into());
    }

    /// Whether a prefix is bound to the directive namespace.
    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    /// Split `prefix:local` into its parts when the prefix is a
    /// registered directive prefix.
    pub fn split_directive_name<'n>(&self, element_name: &'n str) -> Option<(&'n str, &'n str)> {
        let (prefix, local) = element_name.split_once(':')?;
        if self.contains(prefix) {
            Some((prefix, local))
        } else {
            None
        }
    }
}

/// All three registries bundled for one engine instance.
#[derive(Default)]
pub struct Registries {
    pub tokens: TokenRegistry,
    pub namespaces: NamespaceRegistry,
    pub functions: FunctionRegistry,
}
