//! Error types for the template engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while parsing or rendering a template.
///
/// Any of these aborts the whole render; the engine never produces
/// partial output.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No value named \"{0}\" is bound in the data model")]
    DataNotFound(String),

    #[error("Key \"{key}\" not found while resolving query \"{query}\"")]
    KeyNotFound { key: String, query: String },

    #[error("Property \"{property}\" not found while resolving query \"{query}\"")]
    PropertyNotFound { property: String, query: String },

    #[error("Query \"{0}\" traverses a value that is not a container or object")]
    InvalidQuery(String),

    #[error("Unknown helper function: @{0}")]
    UnknownFunction(String),

    #[error("Unknown directive element: {0}")]
    UnknownToken(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Expression error: {0}")]
    Expression(String),

    #[error("Include/extends depth exceeded the configured limit of {0}")]
    IncludeDepth(usize),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for EngineError {
    fn from(e: quick_xml::Error) -> Self {
        EngineError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for EngineError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        EngineError::Xml(e.to_string())
    }
}
