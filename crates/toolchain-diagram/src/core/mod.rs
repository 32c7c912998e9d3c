//! Core abstractions for diagram generation
//!
//! The diagram model, its scoped builder, the renderer trait, shared types,
//! errors and logging setup.

mod builder;
mod error;
mod graph;
pub mod logging;
mod renderer;
mod types;

pub use builder::*;
pub use error::*;
pub use graph::*;
pub use logging::*;
pub use renderer::*;
pub use types::*;
