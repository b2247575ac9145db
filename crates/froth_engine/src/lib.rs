//! # froth_engine
//!
//! An XML directive template engine. Documents are well-formed XML
//! rooted at a `b:template` sentinel; directive elements in the
//! reserved namespace (`b:foreach`, `b:condition`, `b:include`, ...)
//! rewrite the tree in staged, priority-ordered passes, `${path}`
//! placeholders interpolate escaped values from a schema-less data
//! model, and `{{ expr }}` islands run through a sandboxed expression
//! evaluator.
//!
//! ```no_run
//! use froth_engine::{Engine, EngineConfig};
//!
//! # fn main() -> froth_engine::EngineResult<()> {
//! let mut engine = Engine::new(EngineConfig::new("templates"));
//! engine.set("name", "Ann");
//! let html = engine.render_file("welcome")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod expr;
pub mod extender;
pub mod functions;
pub mod indent;
pub mod populate;
pub mod registry;
pub mod template;
pub mod tokenizer;
pub mod tokens;
pub mod util;
pub mod xml;

pub use config::EngineConfig;
pub use data::{DataContext, DataModel, DataResolver, Value};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use functions::FunctionRegistry;
pub use registry::{NamespaceRegistry, Registries, TokenRegistry};
pub use template::Template;
