//! Graphviz DOT source renderer
//!
//! Emits one `digraph` with global defaults, nodes nested in
//! `subgraph cluster_N` blocks that mirror the cluster tree, and all edges
//! at the top level in declaration order.

use std::fmt::Write as _;

use anyhow::Result;
use tracing::{debug, span, Level};

use crate::core::{Attributes, ClusterId, Diagram, Edge, Node, NodeIcon, Renderer};

/// Graph attributes applied before the diagram's own
const GRAPH_DEFAULTS: [(&str, &str); 7] = [
    ("pad", "2.0"),
    ("splines", "ortho"),
    ("nodesep", "0.60"),
    ("ranksep", "0.75"),
    ("fontname", "Sans-Serif"),
    ("fontsize", "15"),
    ("fontcolor", "#2D3436"),
];

const NODE_DEFAULTS: [(&str, &str); 10] = [
    ("shape", "box"),
    ("style", "rounded"),
    ("fixedsize", "true"),
    ("width", "1.4"),
    ("height", "1.4"),
    ("labelloc", "b"),
    ("imagescale", "true"),
    ("fontname", "Sans-Serif"),
    ("fontsize", "13"),
    ("fontcolor", "#2D3436"),
];

const EDGE_DEFAULTS: [(&str, &str); 1] = [("color", "#7B8894")];

/// Font attributes carried by every edge
const EDGE_FONT: [(&str, &str); 3] = [
    ("fontcolor", "#2D3436"),
    ("fontname", "Sans-Serif"),
    ("fontsize", "13"),
];

const CLUSTER_DEFAULTS: [(&str, &str); 6] = [
    ("shape", "box"),
    ("style", "rounded"),
    ("labeljust", "l"),
    ("pencolor", "#AEB6BE"),
    ("fontname", "Sans-Serif"),
    ("fontsize", "12"),
];

/// Cluster background colors, cycled by nesting depth
pub const CLUSTER_BGCOLORS: [&str; 4] = ["#E5F5FD", "#EBF3E7", "#ECE8F6", "#FDF7E3"];

/// Height of a node drawn with an image icon
const IMAGE_NODE_HEIGHT: f64 = 1.9;
const BOX_NODE_HEIGHT: f64 = 1.4;
/// Extra height per additional label line
const LINE_PADDING: f64 = 0.4;

fn defaults(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Quote a value as a DOT string literal
///
/// Backslashes and double quotes are escaped, newlines become the `\n`
/// centered line break and carriage returns are dropped.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Identifier of a node in the emitted DOT
pub fn node_ident(node: &Node) -> String {
    format!("n{}", node.id.index())
}

fn cluster_ident(id: ClusterId) -> String {
    format!("cluster_{}", id.index())
}

fn format_attrs(attrs: &Attributes) -> String {
    let body: Vec<String> = attrs
        .iter()
        .map(|(key, value)| format!("{}={}", key, quote(value)))
        .collect();
    format!("[{}]", body.join(" "))
}

/// Graph-level attributes: defaults, then title and direction, then the
/// diagram's own overrides
pub fn graph_attributes(diagram: &Diagram) -> Attributes {
    let mut attrs = defaults(&GRAPH_DEFAULTS);
    attrs.insert("label".into(), diagram.title().to_string());
    attrs.insert("rankdir".into(), diagram.direction().rankdir().to_string());
    attrs.extend(diagram.graph_attr().clone());
    attrs
}

/// Per-node attributes, on top of the `node [...]` defaults
pub fn node_attributes(node: &Node) -> Attributes {
    let padding = LINE_PADDING * (node.line_count() - 1) as f64;
    let mut attrs = Attributes::new();
    attrs.insert("label".into(), node.label.clone());
    match &node.icon {
        NodeIcon::Custom(path) => {
            attrs.insert("shape".into(), "none".into());
            attrs.insert("image".into(), path.display().to_string());
            attrs.insert("height".into(), format!("{:.1}", IMAGE_NODE_HEIGHT + padding));
        }
        NodeIcon::Builtin(icon) => {
            attrs.insert("style".into(), "rounded,filled".into());
            attrs.insert("fillcolor".into(), icon.color().into());
            attrs.insert("fontcolor".into(), "#FFFFFF".into());
            attrs.insert("labelloc".into(), "c".into());
            attrs.insert("tooltip".into(), icon.category().into());
            attrs.insert("height".into(), format!("{:.1}", BOX_NODE_HEIGHT + padding));
        }
    }
    attrs
}

/// Per-edge attributes, on top of the `edge [...]` defaults
pub fn edge_attributes(edge: &Edge) -> Attributes {
    let mut attrs = defaults(&EDGE_FONT);
    if let Some(color) = &edge.attrs.color {
        attrs.insert("color".into(), color.clone());
    }
    if let Some(style) = edge.attrs.style.dot_style() {
        attrs.insert("style".into(), style.into());
    }
    if let Some(label) = &edge.attrs.label {
        attrs.insert("label".into(), label.clone());
    }
    attrs
}

/// DOT source renderer
#[derive(Debug, Clone, Default)]
pub struct DotRenderer;

impl DotRenderer {
    pub fn new() -> Self {
        Self
    }

    fn write_scope(
        &self,
        out: &mut String,
        diagram: &Diagram,
        scope: Option<ClusterId>,
        depth: usize,
    ) -> Result<()> {
        let indent = "\t".repeat(depth + 1);
        for node in diagram.nodes_in(scope) {
            writeln!(
                out,
                "{}{} {}",
                indent,
                node_ident(node),
                format_attrs(&node_attributes(node))
            )?;
        }
        for cluster in diagram.clusters_in(scope) {
            let mut attrs = defaults(&CLUSTER_DEFAULTS);
            attrs.insert(
                "bgcolor".into(),
                CLUSTER_BGCOLORS[cluster.depth % CLUSTER_BGCOLORS.len()].into(),
            );
            attrs.insert("label".into(), cluster.label.clone());
            attrs.extend(cluster.attrs.clone());

            writeln!(out, "{}subgraph {} {{", indent, cluster_ident(cluster.id))?;
            writeln!(out, "{}\tgraph {}", indent, format_attrs(&attrs))?;
            self.write_scope(out, diagram, Some(cluster.id), depth + 1)?;
            writeln!(out, "{}}}", indent)?;
        }
        Ok(())
    }
}

impl Renderer for DotRenderer {
    type Output = String;

    fn render(&self, diagram: &Diagram) -> Result<Self::Output> {
        let render_span = span!(
            Level::DEBUG,
            "render_dot",
            nodes = diagram.node_count(),
            clusters = diagram.cluster_count(),
            edges = diagram.edge_count()
        );
        let _enter = render_span.enter();

        diagram.validate()?;

        let mut out = String::new();
        writeln!(out, "digraph {} {{", quote(diagram.title()))?;
        writeln!(out, "\tgraph {}", format_attrs(&graph_attributes(diagram)))?;
        writeln!(out, "\tnode {}", format_attrs(&defaults(&NODE_DEFAULTS)))?;
        writeln!(out, "\tedge {}", format_attrs(&defaults(&EDGE_DEFAULTS)))?;

        self.write_scope(&mut out, diagram, None, 0)?;

        for edge in diagram.edges() {
            // validate() guarantees both ends exist
            let (Some(from), Some(to)) = (diagram.get_node(edge.from), diagram.get_node(edge.to))
            else {
                continue;
            };
            writeln!(
                out,
                "\t{} -> {} {}",
                node_ident(from),
                node_ident(to),
                format_attrs(&edge_attributes(edge))
            )?;
        }
        out.push_str("}\n");

        debug!(bytes = out.len(), "DOT source generated");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "dot"
    }

    fn format(&self) -> &'static str {
        "dot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{attributes, BuiltinIcon, EdgeAttrs, EdgeStyle, Scope};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn sample() -> Diagram {
        let mut diagram = Diagram::new("Sample \"Stack\"")
            .with_graph_attrs(attributes([("pad", "0.8"), ("bgcolor", "white")]));
        let tf = diagram.node("Terraform\nRoot Module", BuiltinIcon::Terraform);
        let (docker, k3d) = diagram
            .cluster("Infra", attributes([("pencolor", "#0066CC")]), |infra| {
                let docker = infra.node("Docker Engine", BuiltinIcon::Docker);
                let k3d = infra.cluster("Nested", Attributes::new(), |nested| {
                    Ok(nested.node("K3D Cluster", NodeIcon::Custom(PathBuf::from("k3d.svg"))))
                })?;
                Ok((docker, k3d))
            })
            .unwrap();
        diagram.chain(&[tf, docker, k3d], EdgeAttrs::new()).unwrap();
        diagram
            .edge(tf, k3d, EdgeAttrs::new().color("#5C4EE5").style(EdgeStyle::Dashed))
            .unwrap();
        diagram
    }

    #[test]
    fn test_renderer_identity() {
        let renderer = DotRenderer::new();
        assert_eq!(renderer.name(), "dot");
        assert_eq!(renderer.format(), "dot");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\nb"), "\"a\\nb\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("C:\\icons"), "\"C:\\\\icons\"");
        assert_eq!(quote("a\r\nb"), "\"a\\nb\"");
    }

    #[test]
    fn test_graph_attributes_merge_order() {
        let attrs = graph_attributes(&sample());
        assert_eq!(attrs["pad"], "0.8");
        assert_eq!(attrs["splines"], "ortho");
        assert_eq!(attrs["bgcolor"], "white");
        assert_eq!(attrs["rankdir"], "LR");
        assert_eq!(attrs["label"], "Sample \"Stack\"");
    }

    #[test]
    fn test_image_node_height_grows_with_lines() {
        let diagram = sample();
        let k3d = diagram.find_node("K3D Cluster").unwrap();
        let attrs = node_attributes(k3d);
        assert_eq!(attrs["shape"], "none");
        assert_eq!(attrs["image"], "k3d.svg");
        assert_eq!(attrs["height"], "1.9");

        let tf = diagram.find_node("Terraform").unwrap();
        let attrs = node_attributes(tf);
        assert_eq!(attrs["fillcolor"], BuiltinIcon::Terraform.color());
        assert_eq!(attrs["height"], "1.8");
        assert!(!attrs.contains_key("image"));
    }

    #[test]
    fn test_edge_attributes() {
        let diagram = sample();
        let edges: Vec<_> = diagram.edges().collect();
        let plain = edge_attributes(edges[0]);
        assert!(!plain.contains_key("color"));
        assert!(!plain.contains_key("style"));
        assert_eq!(plain["fontname"], "Sans-Serif");

        let styled = edge_attributes(edges[2]);
        assert_eq!(styled["color"], "#5C4EE5");
        assert_eq!(styled["style"], "dashed");
    }

    #[test]
    fn test_render_structure() {
        let dot = DotRenderer::new().render(&sample()).unwrap();
        assert!(dot.starts_with("digraph \"Sample \\\"Stack\\\"\" {\n"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("\tsubgraph cluster_0 {\n"));
        assert!(dot.contains("\t\tsubgraph cluster_1 {\n"));
        assert!(dot.contains("label=\"Terraform\\nRoot Module\""));
        assert!(dot.contains("\tn0 -> n1 ["));
        assert!(dot.contains("\tn1 -> n2 ["));
        assert!(dot.contains("\tn0 -> n2 [color=\"#5C4EE5\""));
        assert_eq!(dot.matches(" -> ").count(), 3);
    }

    #[test]
    fn test_cluster_background_by_depth() {
        let dot = DotRenderer::new().render(&sample()).unwrap();
        let outer = dot.find("subgraph cluster_0").unwrap();
        let inner = dot.find("subgraph cluster_1").unwrap();
        assert!(dot[outer..inner].contains(CLUSTER_BGCOLORS[0]));
        assert!(dot[inner..].contains(CLUSTER_BGCOLORS[1]));
        assert!(dot[outer..inner].contains("pencolor=\"#0066CC\""));
    }

    #[test]
    fn test_nodes_emitted_inside_their_cluster() {
        let dot = DotRenderer::new().render(&sample()).unwrap();
        let inner = dot.find("subgraph cluster_1").unwrap();
        let k3d_decl = dot.find("\t\t\tn2 [").unwrap();
        assert!(k3d_decl > inner);
    }

    proptest! {
        #[test]
        fn quoted_values_stay_single_line_and_closed(value in ".*") {
            let quoted = quote(&value);
            prop_assert!(!quoted.contains('\n'));
            prop_assert!(quoted.starts_with('"') && quoted.ends_with('"'));

            // every interior quote is escaped
            let inner: Vec<char> = quoted[1..quoted.len() - 1].chars().collect();
            let mut escaped = false;
            for c in inner {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else {
                    prop_assert_ne!(c, '"');
                }
            }
            prop_assert!(!escaped);
        }
    }
}
