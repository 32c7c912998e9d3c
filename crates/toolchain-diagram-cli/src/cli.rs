//! Command-line interface for the toolchain-diagram utility
//!
//! Running with no subcommand performs a full `generate` in the current
//! directory.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use toolchain_diagram::assets::AssetPaths;
use toolchain_diagram::core::logging::{init_logging, LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use toolchain_diagram::render::{DEFAULT_DOT_COMMAND, DOT_COMMAND_ENV};
use toolchain_diagram::{generate, toolchain, toolchain_dot, Diagram, GenerateOptions, OutputFormat};

/// Toolchain Diagram - render the DevOps toolchain architecture diagram
#[derive(Parser)]
#[command(name = "toolchain-diagram")]
#[command(about = "Renders the Terraform / K3D / Helm toolchain diagram through Graphviz")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch icons and render the diagram (default)
    Generate(GenerateArgs),

    /// Print the DOT source of the diagram without fetching anything
    Dot {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the nodes, clusters and edges of the diagram
    Summary {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    /// Directory receiving the icons and the rendered diagram
    #[arg(short = 'd', long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    pub format: FormatChoice,

    /// Graphviz executable (default: $TOOLCHAIN_DIAGRAM_DOT or `dot`)
    #[arg(long)]
    pub dot_command: Option<String>,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            format: FormatChoice::Png,
            dot_command: None,
        }
    }
}

/// Supported output formats
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum FormatChoice {
    Png,
    Jpg,
    Svg,
    Pdf,
    Dot,
}

impl From<FormatChoice> for OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Png => OutputFormat::Png,
            FormatChoice::Jpg => OutputFormat::Jpg,
            FormatChoice::Svg => OutputFormat::Svg,
            FormatChoice::Pdf => OutputFormat::Pdf,
            FormatChoice::Dot => OutputFormat::Dot,
        }
    }
}

#[derive(Serialize)]
struct NodeSummary<'a> {
    name: &'a str,
    label: &'a str,
    icon: String,
    cluster: Option<&'a str>,
}

#[derive(Serialize)]
struct ClusterSummary<'a> {
    label: &'a str,
    parent: Option<&'a str>,
}

#[derive(Serialize)]
struct EdgeSummary<'a> {
    from: &'a str,
    to: &'a str,
    style: String,
    color: Option<&'a str>,
}

#[derive(Serialize)]
struct DiagramSummary<'a> {
    title: &'a str,
    output: String,
    nodes: Vec<NodeSummary<'a>>,
    clusters: Vec<ClusterSummary<'a>>,
    edges: Vec<EdgeSummary<'a>>,
}

impl<'a> DiagramSummary<'a> {
    fn new(diagram: &'a Diagram) -> Self {
        let cluster_label = move |id| diagram.get_cluster(id).map(|c| c.label.as_str());
        let node_name = move |id| diagram.get_node(id).map_or("?", |n| n.name());

        Self {
            title: diagram.title(),
            output: diagram.output_file_name(),
            nodes: diagram
                .nodes()
                .map(|n| NodeSummary {
                    name: n.name(),
                    label: &n.label,
                    icon: n.icon.to_string(),
                    cluster: n.cluster.and_then(cluster_label),
                })
                .collect(),
            clusters: diagram
                .clusters()
                .map(|c| ClusterSummary {
                    label: &c.label,
                    parent: c.parent.and_then(cluster_label),
                })
                .collect(),
            edges: diagram
                .edges()
                .map(|e| EdgeSummary {
                    from: node_name(e.from),
                    to: node_name(e.to),
                    style: e.attrs.style.to_string(),
                    color: e.attrs.color.as_deref(),
                })
                .collect(),
        }
    }

    fn to_text(&self) -> String {
        let mut out = format!("{}\n-> {}\n", self.title, self.output);

        out.push_str(&format!("\nNodes ({}):\n", self.nodes.len()));
        for node in &self.nodes {
            let scope = node.cluster.unwrap_or("(top level)");
            out.push_str(&format!("  {:<16} {:<22} {}\n", node.name, node.icon, scope));
        }

        out.push_str(&format!("\nClusters ({}):\n", self.clusters.len()));
        for cluster in &self.clusters {
            match cluster.parent {
                Some(parent) => out.push_str(&format!("  {} (in {})\n", cluster.label, parent)),
                None => out.push_str(&format!("  {}\n", cluster.label)),
            }
        }

        out.push_str(&format!("\nEdges ({}):\n", self.edges.len()));
        for edge in &self.edges {
            let color = edge.color.unwrap_or("default");
            out.push_str(&format!(
                "  {} -> {} [{}, {}]\n",
                edge.from, edge.to, edge.style, color
            ));
        }
        out
    }
}

/// Main CLI application
#[derive(Default)]
pub struct ToolchainApp;

impl ToolchainApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());
        let log_format = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());

        if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("toolchain-diagram v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command.unwrap_or_else(|| Commands::Generate(GenerateArgs::default())) {
            Commands::Generate(args) => self.generate_command(args, cli.verbose),
            Commands::Dot { output } => self.dot_command(output, cli.verbose),
            Commands::Summary { json } => self.summary_command(json),
        }
    }

    fn generate_options(args: GenerateArgs) -> GenerateOptions {
        let dot_command = args
            .dot_command
            .or_else(|| std::env::var(DOT_COMMAND_ENV).ok())
            .unwrap_or_else(|| DEFAULT_DOT_COMMAND.to_string());
        GenerateOptions {
            work_dir: args.work_dir,
            format: args.format.into(),
            dot_command,
        }
    }

    /// Handle the generate command
    fn generate_command(&self, args: GenerateArgs, verbose: bool) -> Result<()> {
        let options = Self::generate_options(args);
        if verbose {
            eprintln!(
                "Rendering {} into {} with '{}'",
                options.format,
                options.work_dir.display(),
                options.dot_command
            );
        }

        let path = generate(&options)?;
        info!(path = %path.display(), "Done");
        println!("{}", path.display());
        Ok(())
    }

    /// Handle the dot command
    fn dot_command(&self, output: Option<PathBuf>, verbose: bool) -> Result<()> {
        let source = toolchain_dot()?;
        match output {
            Some(path) if path.to_str() != Some("-") => {
                fs::write(&path, &source)?;
                if verbose {
                    eprintln!("Wrote {} bytes to {}", source.len(), path.display());
                }
            }
            _ => {
                io::stdout().write_all(source.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Handle the summary command
    fn summary_command(&self, json: bool) -> Result<()> {
        let diagram = toolchain::build(&AssetPaths::planned(".", &toolchain::ICONS))?;
        let summary = DiagramSummary::new(&diagram);
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print!("{}", summary.to_text());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagram() -> Diagram {
        toolchain::build(&AssetPaths::planned(".", &toolchain::ICONS)).unwrap()
    }

    #[test]
    fn test_no_arguments_means_generate() {
        let cli = Cli::try_parse_from(["toolchain-diagram"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "toolchain-diagram",
            "generate",
            "--work-dir",
            "out",
            "--format",
            "svg",
            "--dot-command",
            "/opt/graphviz/bin/dot",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Generate(args)) => {
                assert_eq!(args.work_dir, PathBuf::from("out"));
                assert_eq!(args.format, FormatChoice::Svg);
                let options = ToolchainApp::generate_options(args);
                assert_eq!(options.format, OutputFormat::Svg);
                assert_eq!(options.dot_command, "/opt/graphviz/bin/dot");
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_generate_defaults_match_library() {
        let cli = Cli::try_parse_from(["toolchain-diagram", "generate"]).unwrap();
        match cli.command {
            Some(Commands::Generate(args)) => assert_eq!(args, GenerateArgs::default()),
            _ => panic!("expected generate"),
        }
        assert_eq!(
            OutputFormat::from(GenerateArgs::default().format),
            GenerateOptions::default().format
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["toolchain-diagram", "summary", "--json", "--log-level", "debug"])
                .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(matches!(cli.command, Some(Commands::Summary { json: true })));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["toolchain-diagram", "generate", "--format", "bmp"]).is_err());
    }

    #[test]
    fn test_summary_text() {
        let diagram = diagram();
        let text = DiagramSummary::new(&diagram).to_text();
        assert!(text.starts_with("DevOps Tools on K3D Cluster with Terraform\n"));
        assert!(text.contains("-> terraform_k3d_diagram.png"));
        assert!(text.contains("Nodes (10):"));
        assert!(text.contains("Clusters (4):"));
        assert!(text.contains("Edges (10):"));
        assert!(text.contains("  GitOps & CI/CD (in K8s Services)\n"));
        assert!(text.contains("  K3D Cluster -> Helm [dashed, #0066CC]\n"));
        assert!(text.contains("  Docker Engine -> K3D Cluster [solid, default]\n"));
    }

    #[test]
    fn test_summary_json() {
        let diagram = diagram();
        let json = serde_json::to_value(DiagramSummary::new(&diagram)).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 10);
        assert_eq!(json["edges"].as_array().unwrap().len(), 10);
        assert_eq!(json["nodes"][0]["name"], "Terraform");
        assert!(json["nodes"][0]["cluster"].is_null());
        assert_eq!(json["nodes"][8]["icon"], "rancher.png");
        assert_eq!(json["clusters"][3]["parent"], "K8s Services");
    }
}
