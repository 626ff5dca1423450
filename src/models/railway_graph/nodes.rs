use super::RailwayGraph;
use crate::models::node::{Node, NodeKind, SwitchState};
use crate::models::track::Edge;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

/// Extension trait for node and edge lookups on `RailwayGraph`
pub trait Nodes {
    fn node(&self, index: NodeIndex) -> Option<&Node>;

    /// Node name, or `?` for an index that is not in the graph
    fn node_name(&self, index: NodeIndex) -> &str;

    fn edge(&self, index: EdgeIndex) -> Option<&Edge>;

    /// Edge name, or `?` for an index that is not in the graph
    fn edge_name(&self, index: EdgeIndex) -> &str;

    fn edge_endpoints(&self, index: EdgeIndex) -> Option<(NodeIndex, NodeIndex)>;

    /// Directed edge from `from` to `to`
    fn edge_between(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeIndex>;

    /// Edges a train on `edge` may continue onto, honouring switch geometry
    fn successors(&self, edge: EdgeIndex) -> Vec<EdgeIndex>;

    /// Translate a node path into the directed edges connecting it
    fn path_edges(&self, nodes: &[NodeIndex]) -> Option<Vec<EdgeIndex>>;

    fn set_switch_state(&mut self, index: NodeIndex, new_state: SwitchState);
}

impl Nodes for RailwayGraph {
    fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(index)
    }

    fn node_name(&self, index: NodeIndex) -> &str {
        self.node(index).map_or("?", |node| node.name.as_str())
    }

    fn edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.graph.edge_weight(index)
    }

    fn edge_name(&self, index: EdgeIndex) -> &str {
        self.edge(index).map_or("?", |edge| edge.name.as_str())
    }

    fn edge_endpoints(&self, index: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(index)
    }

    fn edge_between(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(from, to)
    }

    fn successors(&self, edge: EdgeIndex) -> Vec<EdgeIndex> {
        let Some((from, via)) = self.edge_endpoints(edge) else {
            return Vec::new();
        };
        let Some(node) = self.node(via) else {
            return Vec::new();
        };

        self.graph
            .edges(via)
            .filter(|next| node.allows_passage(from, next.target()))
            .map(|next| next.id())
            .collect()
    }

    fn path_edges(&self, nodes: &[NodeIndex]) -> Option<Vec<EdgeIndex>> {
        nodes
            .windows(2)
            .map(|pair| self.edge_between(pair[0], pair[1]))
            .collect()
    }

    fn set_switch_state(&mut self, index: NodeIndex, new_state: SwitchState) {
        if let Some(Node { kind: NodeKind::Switch { state, .. }, .. }) = self.graph.node_weight_mut(index) {
            *state = new_state;
        }
    }
}
