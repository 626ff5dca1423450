use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalState {
    Halt,
    Go,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SwitchState {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Plain,
    Signal {
        state: SignalState,
        /// Neighbour node trains come from when they face this signal
        approach: NodeIndex,
        /// Resolved from `approach` during signal initialization
        incoming: Option<EdgeIndex>,
    },
    Switch {
        state: SwitchState,
        head: NodeIndex,
        left: NodeIndex,
        right: NodeIndex,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: NodeKind::Plain }
    }

    #[must_use]
    pub fn is_signal(&self) -> bool {
        matches!(self.kind, NodeKind::Signal { .. })
    }

    #[must_use]
    pub fn is_switch(&self) -> bool {
        matches!(self.kind, NodeKind::Switch { .. })
    }

    /// Edge a train has to arrive on for this signal to apply to it
    #[must_use]
    pub fn signal_incoming(&self) -> Option<EdgeIndex> {
        match self.kind {
            NodeKind::Signal { incoming, .. } => incoming,
            _ => None,
        }
    }

    /// Whether a move `from -> self -> to` is allowed by the node's geometry
    ///
    /// Trains never reverse at a node. At a switch they go head to left/right
    /// or left/right to head, never left to right.
    #[must_use]
    pub fn allows_passage(&self, from: NodeIndex, to: NodeIndex) -> bool {
        if from == to {
            return false;
        }
        match self.kind {
            NodeKind::Switch { head, left, right, .. } => {
                if from == head {
                    to == left || to == right
                } else if from == left || from == right {
                    to == head
                } else {
                    false
                }
            }
            _ => true,
        }
    }

    /// Switch position needed to pass from `from` to `to`
    #[must_use]
    pub fn required_switch_state(&self, from: NodeIndex, to: NodeIndex) -> Option<SwitchState> {
        match self.kind {
            NodeKind::Switch { left, right, .. } => {
                if from == left || to == left {
                    Some(SwitchState::Left)
                } else if from == right || to == right {
                    Some(SwitchState::Right)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
