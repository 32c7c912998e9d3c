//! In-memory diagram model
//!
//! A [`Diagram`] owns every node, cluster and edge plus the global render
//! options. Identifiers are dense indices assigned in declaration order,
//! which keeps iteration and rendered output deterministic.

use anyhow::Result;
use serde::Serialize;
use tracing::trace;

use super::{Attributes, DiagramError, Direction, EdgeStyle, NodeIcon, OutputFormat};

/// Identifier of a node within its diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifier of a cluster within its diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ClusterId(usize);

impl ClusterId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A labeled component in the diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    /// Display label, lines separated by `\n`
    pub label: String,
    pub icon: NodeIcon,
    /// Immediately-enclosing cluster, `None` at the top level
    pub cluster: Option<ClusterId>,
}

impl Node {
    /// First line of the label, used as the node's short name
    pub fn name(&self) -> &str {
        self.label.lines().next().unwrap_or("")
    }

    /// Number of label lines
    pub fn line_count(&self) -> usize {
        self.label.lines().count().max(1)
    }
}

/// A styled visual grouping of nodes and nested clusters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub label: String,
    /// Style overrides (bgcolor, pencolor, penwidth, style, ...)
    pub attrs: Attributes,
    pub parent: Option<ClusterId>,
    /// Nesting depth, 0 for clusters directly under the diagram
    pub depth: usize,
}

/// Presentational attributes of an edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeAttrs {
    pub color: Option<String>,
    pub style: EdgeStyle,
    pub label: Option<String>,
}

impl EdgeAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn style(mut self, style: EdgeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A directed, styled connection between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub attrs: EdgeAttrs,
}

/// The top-level canvas and global configuration holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagram {
    title: String,
    /// Output file name without extension
    filename: String,
    format: OutputFormat,
    direction: Direction,
    graph_attr: Attributes,
    nodes: Vec<Node>,
    clusters: Vec<Cluster>,
    edges: Vec<Edge>,
}

impl Diagram {
    /// Create an empty diagram
    ///
    /// The file name defaults to the title lowercased with spaces replaced
    /// by underscores.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let filename = title.to_lowercase().replace(' ', "_");
        Self {
            title,
            filename,
            format: OutputFormat::default(),
            direction: Direction::default(),
            graph_attr: Attributes::new(),
            nodes: Vec::new(),
            clusters: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Merge graph-wide attributes, later values win
    pub fn with_graph_attrs(mut self, attrs: Attributes) -> Self {
        self.graph_attr.extend(attrs);
        self
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// File name including the format's extension
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self.filename, self.format.extension())
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn graph_attr(&self) -> &Attributes {
        &self.graph_attr
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.0)
    }

    /// Find a node by the first line of its label
    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    /// Find a cluster by label
    pub fn find_cluster(&self, label: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.label == label)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes whose immediately-enclosing scope is `cluster` (`None` for top level)
    pub fn nodes_in(&self, cluster: Option<ClusterId>) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.cluster == cluster)
    }

    /// Clusters directly nested in `parent` (`None` for top level)
    pub fn clusters_in(&self, parent: Option<ClusterId>) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(move |c| c.parent == parent)
    }

    /// Edge endpoints as (from, to) node names, in declaration order
    pub fn edge_names(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .filter_map(|e| Some((self.get_node(e.from)?.name(), self.get_node(e.to)?.name())))
            .collect()
    }

    /// Check the structural invariants
    ///
    /// Every edge must reference existing nodes, every node's cluster must
    /// exist, and a cluster's parent must be declared before it.
    pub fn validate(&self) -> Result<()> {
        for (index, edge) in self.edges.iter().enumerate() {
            for end in [edge.from, edge.to] {
                if self.get_node(end).is_none() {
                    return Err(DiagramError::topology_error(format!(
                        "edge {} references unknown node {}",
                        index, end.0
                    ))
                    .into());
                }
            }
        }
        for node in &self.nodes {
            if let Some(cluster) = node.cluster {
                if self.get_cluster(cluster).is_none() {
                    return Err(DiagramError::topology_error(format!(
                        "node '{}' belongs to unknown cluster {}",
                        node.name(),
                        cluster.0
                    ))
                    .into());
                }
            }
        }
        for cluster in &self.clusters {
            if matches!(cluster.parent, Some(parent) if parent >= cluster.id) {
                return Err(DiagramError::topology_error(format!(
                    "cluster '{}' is nested in a cluster declared after it",
                    cluster.label
                ))
                .into());
            }
        }
        Ok(())
    }

    pub(crate) fn push_node(
        &mut self,
        label: String,
        icon: NodeIcon,
        cluster: Option<ClusterId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        trace!(id = id.0, label = %label, icon = %icon, "Adding node");
        self.nodes.push(Node {
            id,
            label,
            icon,
            cluster,
        });
        id
    }

    pub(crate) fn push_cluster(
        &mut self,
        label: String,
        attrs: Attributes,
        parent: Option<ClusterId>,
    ) -> ClusterId {
        let id = ClusterId(self.clusters.len());
        let depth = parent
            .and_then(|p| self.get_cluster(p))
            .map_or(0, |p| p.depth + 1);
        trace!(id = id.0, label = %label, depth, "Adding cluster");
        self.clusters.push(Cluster {
            id,
            label,
            attrs,
            parent,
            depth,
        });
        id
    }

    pub(crate) fn push_edge(&mut self, from: NodeId, to: NodeId, attrs: EdgeAttrs) -> Result<()> {
        for end in [from, to] {
            if self.get_node(end).is_none() {
                return Err(DiagramError::topology_error(format!(
                    "edge references unknown node {}",
                    end.0
                ))
                .into());
            }
        }
        trace!(from = from.0, to = to.0, style = %attrs.style, "Adding edge");
        self.edges.push(Edge { from, to, attrs });
        Ok(())
    }
}
