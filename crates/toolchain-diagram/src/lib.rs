//! Toolchain Diagram - render the DevOps toolchain architecture diagram
//!
//! Fetches three icon assets, declares the fixed topology (Terraform, Docker,
//! K3D, Helm, GitOps/CI tooling, management dashboards) as an in-memory
//! [`Diagram`], and hands it to Graphviz to produce an image.
//!
//! # Quick Start
//!
//! ```no_run
//! use toolchain_diagram::{generate, GenerateOptions};
//!
//! // Downloads icons and writes ./terraform_k3d_diagram.png
//! let path = generate(&GenerateOptions::default()).unwrap();
//! println!("{}", path.display());
//! ```
//!
//! # Inspecting the topology
//!
//! ```rust
//! use toolchain_diagram::prelude::*;
//!
//! let assets = AssetPaths::planned(".", &toolchain::ICONS);
//! let diagram = toolchain::build(&assets).unwrap();
//! assert_eq!(diagram.node_count(), 10);
//!
//! let dot = DotRenderer::new().render(&diagram).unwrap();
//! assert!(dot.contains("subgraph cluster_0"));
//! ```

pub mod assets;
pub mod core;
pub mod render;
pub mod toolchain;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, span, Level};

pub use crate::core::*;
use crate::assets::{fetch_assets, AssetPaths, HttpTransport, Transport};
use crate::render::{DotRenderer, GraphvizRenderer, DEFAULT_DOT_COMMAND};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assets::{fetch_assets, AssetPaths, HttpTransport, IconAsset, Transport};
    pub use crate::core::{
        BuiltinIcon, Diagram, DiagramError, Direction, EdgeAttrs, EdgeStyle, NodeIcon,
        OutputFormat, Renderer, Scope,
    };
    pub use crate::render::{DotRenderer, GraphvizRenderer};
    pub use crate::toolchain;
}

/// Options for a full generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Directory receiving the icons and the output image
    pub work_dir: PathBuf,
    pub format: OutputFormat,
    /// Graphviz executable
    pub dot_command: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            format: OutputFormat::Png,
            dot_command: DEFAULT_DOT_COMMAND.to_string(),
        }
    }
}

/// Fetch icons, build the topology and render it with Graphviz
///
/// Returns the path of the written file. Fails without writing a diagram if
/// any icon cannot be fetched or Graphviz fails.
pub fn generate(options: &GenerateOptions) -> Result<PathBuf> {
    let renderer =
        GraphvizRenderer::new(&options.work_dir).with_command(options.dot_command.clone());
    generate_with(&HttpTransport::new(), &renderer, &options.work_dir, options.format)
}

/// [`generate`] with an explicit transport and renderer
///
/// Icons are fetched into `work_dir` and the diagram references them by
/// absolute path, so the renderer may write its output somewhere else.
pub fn generate_with<R>(
    transport: &impl Transport,
    renderer: &R,
    work_dir: impl AsRef<Path>,
    format: OutputFormat,
) -> Result<R::Output>
where
    R: Renderer,
{
    let work_dir = work_dir.as_ref();
    let run_span = span!(Level::INFO, "generate", work_dir = %work_dir.display(), format = %format);
    let _enter = run_span.enter();

    let assets = fetch_assets(transport, &toolchain::ICONS, work_dir)?;
    info!(count = assets.len(), "Icons fetched");

    let mut diagram = toolchain::build(&assets.resolved()?)?;
    diagram.set_format(format);

    info!(renderer = renderer.name(), "Rendering diagram");
    renderer.render(&diagram)
}

/// DOT source of the topology, with icons referenced by their file names
///
/// Nothing is fetched.
pub fn toolchain_dot() -> Result<String> {
    let diagram = toolchain::build(&AssetPaths::planned(".", &toolchain::ICONS))?;
    DotRenderer::new().render(&diagram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = GenerateOptions::default();
        assert_eq!(options.work_dir, PathBuf::from("."));
        assert_eq!(options.format, OutputFormat::Png);
        assert_eq!(options.dot_command, "dot");
    }

    #[test]
    fn test_toolchain_dot() {
        let dot = toolchain_dot().unwrap();
        assert!(dot.starts_with("digraph \"DevOps Tools on K3D Cluster with Terraform\""));
        assert!(dot.contains("image=\"k3d.svg\""));
        assert!(dot.contains("image=\"rancher.png\""));
        assert!(dot.contains("image=\"localstack.png\""));
    }
}
