//! Scoped diagram construction
//!
//! Nodes are declared inside a [`Scope`]: either the [`Diagram`] itself or a
//! [`ClusterScope`] handed to a closure. A node records the scope it was
//! declared in as its one enclosing cluster, so no node can be orphaned or
//! appear in two clusters.
//!
//! ```rust
//! use toolchain_diagram::core::{attributes, BuiltinIcon, Diagram, EdgeAttrs, EdgeStyle, Scope};
//!
//! let mut diagram = Diagram::new("Example");
//! let terraform = diagram.node("Terraform", BuiltinIcon::Terraform);
//! let docker = diagram
//!     .cluster("Infrastructure", attributes([("style", "rounded")]), |infra| {
//!         Ok(infra.node("Docker Engine", BuiltinIcon::Docker))
//!     })
//!     .unwrap();
//! diagram
//!     .edge(terraform, docker, EdgeAttrs::new().style(EdgeStyle::Bold))
//!     .unwrap();
//! assert_eq!(diagram.node_count(), 2);
//! ```

use anyhow::Result;

use super::{Attributes, ClusterId, Diagram, EdgeAttrs, NodeIcon, NodeId};

/// A place where nodes, clusters and edges can be declared
pub trait Scope {
    /// The diagram being built
    fn diagram_mut(&mut self) -> &mut Diagram;

    /// The cluster this scope represents, `None` for the top level
    fn cluster_id(&self) -> Option<ClusterId>;

    /// Declare a node in this scope
    fn node(&mut self, label: impl Into<String>, icon: impl Into<NodeIcon>) -> NodeId {
        let parent = self.cluster_id();
        self.diagram_mut()
            .push_node(label.into(), icon.into(), parent)
    }

    /// Declare a nested cluster and populate it through `build`
    fn cluster<T>(
        &mut self,
        label: impl Into<String>,
        attrs: Attributes,
        build: impl FnOnce(&mut ClusterScope<'_>) -> Result<T>,
    ) -> Result<T> {
        let parent = self.cluster_id();
        let diagram = self.diagram_mut();
        let id = diagram.push_cluster(label.into(), attrs, parent);
        let mut scope = ClusterScope { diagram, id };
        build(&mut scope)
    }

    /// Declare a directed edge
    fn edge(&mut self, from: NodeId, to: NodeId, attrs: EdgeAttrs) -> Result<()> {
        self.diagram_mut().push_edge(from, to, attrs)
    }

    /// Declare `a -> b -> c ...`, one edge per consecutive pair
    fn chain(&mut self, nodes: &[NodeId], attrs: EdgeAttrs) -> Result<()> {
        for pair in nodes.windows(2) {
            self.edge(pair[0], pair[1], attrs.clone())?;
        }
        Ok(())
    }

    /// Declare one edge from `from` to each of `targets`
    fn fan_out(&mut self, from: NodeId, targets: &[NodeId], attrs: EdgeAttrs) -> Result<()> {
        for &to in targets {
            self.edge(from, to, attrs.clone())?;
        }
        Ok(())
    }
}

impl Scope for Diagram {
    fn diagram_mut(&mut self) -> &mut Diagram {
        self
    }

    fn cluster_id(&self) -> Option<ClusterId> {
        None
    }
}

/// Declaration scope of one cluster
pub struct ClusterScope<'a> {
    diagram: &'a mut Diagram,
    id: ClusterId,
}

impl ClusterScope<'_> {
    pub fn id(&self) -> ClusterId {
        self.id
    }
}

impl Scope for ClusterScope<'_> {
    fn diagram_mut(&mut self) -> &mut Diagram {
        self.diagram
    }

    fn cluster_id(&self) -> Option<ClusterId> {
        Some(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{attributes, BuiltinIcon, EdgeStyle};

    #[test]
    fn test_nodes_record_enclosing_cluster() {
        let mut diagram = Diagram::new("t");
        let top = diagram.node("Top", BuiltinIcon::Terraform);
        let (outer_id, outer_node, inner_node) = diagram
            .cluster("Outer", Attributes::new(), |outer| {
                let outer_node = outer.node("OuterNode", BuiltinIcon::Docker);
                let inner_node = outer.cluster("Inner", Attributes::new(), |inner| {
                    Ok(inner.node("InnerNode", BuiltinIcon::Helm))
                })?;
                Ok((outer.id(), outer_node, inner_node))
            })
            .unwrap();

        assert_eq!(diagram.get_node(top).unwrap().cluster, None);
        assert_eq!(diagram.get_node(outer_node).unwrap().cluster, Some(outer_id));
        let inner_id = diagram.get_node(inner_node).unwrap().cluster.unwrap();
        let inner = diagram.get_cluster(inner_id).unwrap();
        assert_eq!(inner.label, "Inner");
        assert_eq!(inner.parent, Some(outer_id));
        assert_eq!(inner.depth, 1);
    }

    #[test]
    fn test_chain_declares_consecutive_edges() {
        let mut diagram = Diagram::new("t");
        let a = diagram.node("A", BuiltinIcon::Docker);
        let b = diagram.node("B", BuiltinIcon::Docker);
        let c = diagram.node("C", BuiltinIcon::Docker);
        diagram.chain(&[a, b, c], EdgeAttrs::new()).unwrap();
        assert_eq!(diagram.edge_names(), vec![("A", "B"), ("B", "C")]);
    }

    #[test]
    fn test_chain_of_one_is_empty() {
        let mut diagram = Diagram::new("t");
        let a = diagram.node("A", BuiltinIcon::Docker);
        diagram.chain(&[a], EdgeAttrs::new()).unwrap();
        assert_eq!(diagram.edge_count(), 0);
    }

    #[test]
    fn test_fan_out_shares_attributes() {
        let mut diagram = Diagram::new("t");
        let hub = diagram.node("Hub", BuiltinIcon::Helm);
        let x = diagram.node("X", BuiltinIcon::ArgoCd);
        let y = diagram.node("Y", BuiltinIcon::GitLab);
        let attrs = EdgeAttrs::new().color("#004D99").style(EdgeStyle::Bold);
        diagram.fan_out(hub, &[x, y], attrs.clone()).unwrap();

        assert_eq!(diagram.edge_names(), vec![("Hub", "X"), ("Hub", "Y")]);
        assert!(diagram.edges().all(|e| e.attrs == attrs));
    }

    #[test]
    fn test_cluster_error_propagates() {
        let mut diagram = Diagram::new("t");
        let result: Result<()> = diagram.cluster("Broken", attributes([("style", "rounded")]), |_| {
            anyhow::bail!("boom")
        });
        assert!(result.is_err());
        assert_eq!(diagram.cluster_count(), 1);
    }
}
