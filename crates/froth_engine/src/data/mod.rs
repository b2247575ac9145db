//! Data binding: the value model, the named-value store, and the
//! path-query resolver.

pub mod model;
pub mod resolver;
pub mod value;

pub use model::DataModel;
pub use resolver::DataResolver;
pub use value::{DataContext, Value};
