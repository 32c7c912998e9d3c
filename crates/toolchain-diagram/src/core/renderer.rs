//! Core renderer trait for diagram output
//!
//! A renderer turns a finished [`Diagram`] into output: DOT source text, or
//! an image file written by Graphviz. Topology code never depends on a
//! particular renderer.

use anyhow::Result;

use super::Diagram;

/// Core trait for diagram renderers
///
/// # Example
/// ```
/// use toolchain_diagram::core::{Diagram, Renderer};
/// use toolchain_diagram::render::DotRenderer;
///
/// let diagram = Diagram::new("Empty");
/// let dot = DotRenderer::new().render(&diagram).unwrap();
/// assert!(dot.starts_with("digraph"));
/// ```
pub trait Renderer {
    /// The output type of this renderer
    type Output;

    /// Render the diagram into the output format
    fn render(&self, diagram: &Diagram) -> Result<Self::Output>;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the output format produced
    fn format(&self) -> &'static str;
}
