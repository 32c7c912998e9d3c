//! Renderer implementations
//!
//! - [`DotRenderer`]: diagram to Graphviz DOT source text
//! - [`GraphvizRenderer`]: diagram to an image file via the `dot` executable

pub mod dot;
pub mod graphviz;

pub use dot::DotRenderer;
pub use graphviz::{GraphvizRenderer, DEFAULT_DOT_COMMAND, DOT_COMMAND_ENV};
