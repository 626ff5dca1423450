use super::RailwayGraph;
use crate::error::TopologyError;
use crate::models::node::{Node, NodeKind, SignalState};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};

/// Extension trait for signal handling on `RailwayGraph`
pub trait Signals {
    /// Resolve every signal's incoming edge from its approach node and set it to Halt
    ///
    /// Returns the number of signals initialized.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignalApproach` if no track leads from a signal's
    /// approach node to the signal
    fn initialize_signals(&mut self) -> Result<usize, TopologyError>;

    /// Whether `node` is a signal that applies to a train arriving on `arriving`
    fn is_facing_signal(&self, node: NodeIndex, arriving: EdgeIndex) -> bool;

    fn signal_state(&self, node: NodeIndex) -> Option<SignalState>;

    fn set_signal_state(&mut self, node: NodeIndex, new_state: SignalState);
}

impl Signals for RailwayGraph {
    fn initialize_signals(&mut self) -> Result<usize, TopologyError> {
        let signals: Vec<(NodeIndex, NodeIndex)> = self
            .graph
            .node_indices()
            .filter_map(|index| match self.graph.node_weight(index)?.kind {
                NodeKind::Signal { approach, .. } => Some((index, approach)),
                _ => None,
            })
            .collect();

        for &(signal, approach) in &signals {
            let Some(edge) = self.graph.find_edge(approach, signal) else {
                let name = |index| self.graph.node_weight(index).map_or_else(String::new, |n: &Node| n.name.clone());
                return Err(TopologyError::InvalidSignalApproach {
                    signal: name(signal),
                    approach: name(approach),
                });
            };
            if let Some(Node { kind: NodeKind::Signal { state, incoming, .. }, .. }) = self.graph.node_weight_mut(signal) {
                *incoming = Some(edge);
                *state = SignalState::Halt;
            }
        }

        Ok(signals.len())
    }

    fn is_facing_signal(&self, node: NodeIndex, arriving: EdgeIndex) -> bool {
        self.graph
            .node_weight(node)
            .and_then(Node::signal_incoming)
            .is_some_and(|incoming| incoming == arriving)
    }

    fn signal_state(&self, node: NodeIndex) -> Option<SignalState> {
        match self.graph.node_weight(node)?.kind {
            NodeKind::Signal { state, .. } => Some(state),
            _ => None,
        }
    }

    fn set_signal_state(&mut self, node: NodeIndex, new_state: SignalState) {
        if let Some(Node { kind: NodeKind::Signal { state, .. }, .. }) = self.graph.node_weight_mut(node) {
            *state = new_state;
        }
    }
}
