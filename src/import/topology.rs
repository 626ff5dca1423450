use crate::constants::DEFAULT_MAX_SPEED;
use crate::error::TopologyError;
use crate::models::{Node, NodeKind, Nodes, RailwayGraph, SignalState, SwitchState};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSpec {
    Plain {
        name: String,
    },
    Signal {
        name: String,
        /// Neighbour node a train comes from when it faces the signal
        approach: String,
    },
    Switch {
        name: String,
        head: String,
        left: String,
        right: String,
    },
}

impl NodeSpec {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            NodeSpec::Plain { name } | NodeSpec::Signal { name, .. } | NodeSpec::Switch { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackSpec {
    pub name: String,
    pub from: String,
    pub to: String,
    pub length: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
}

fn default_max_speed() -> f64 {
    DEFAULT_MAX_SPEED
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformSpec {
    pub name: String,
    /// Name of the directed edge the platform lies on
    pub edge: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TopologySpec {
    pub nodes: Vec<NodeSpec>,
    pub tracks: Vec<TrackSpec>,
    #[serde(default)]
    pub platforms: Vec<PlatformSpec>,
}

impl TopologySpec {
    /// Parse a topology from JSON text
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the JSON does not describe a topology
    pub fn from_json(content: &str) -> Result<Self, TopologyError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read and parse a topology file
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Parse` on unreadable or malformed files
    pub fn from_file(path: &Path) -> Result<Self, TopologyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build the railway graph
    ///
    /// Signal directions are kept as their approach node; the incoming edge
    /// is resolved when the controller initializes its signals.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate names, references to unknown nodes or
    /// edges, and switches whose legs are not connected to them
    pub fn build(&self, reverse_suffix: &str) -> Result<RailwayGraph, TopologyError> {
        let mut graph = RailwayGraph::new();

        // Step 1: every node as plain, so tracks and roles can refer to any of them
        for spec in &self.nodes {
            graph.add_node(Node::plain(spec.name()))?;
        }

        // Step 2: tracks as opposing edge pairs
        for track in &self.tracks {
            let from = graph.node_index(&track.from)?;
            let to = graph.node_index(&track.to)?;
            graph.add_track(&track.name, from, to, track.length, track.max_speed, reverse_suffix)?;
        }

        // Step 3: node roles
        for spec in &self.nodes {
            let index = graph.node_index(spec.name())?;
            let kind = match spec {
                NodeSpec::Plain { .. } => continue,
                NodeSpec::Signal { approach, .. } => NodeKind::Signal {
                    state: SignalState::Halt,
                    approach: graph.node_index(approach)?,
                    incoming: None,
                },
                NodeSpec::Switch { name, head, left, right, .. } => {
                    let head = graph.node_index(head)?;
                    let left = graph.node_index(left)?;
                    let right = graph.node_index(right)?;
                    for neighbour in [head, left, right] {
                        if graph.edge_between(index, neighbour).is_none() {
                            return Err(TopologyError::DisconnectedSwitch {
                                switch: name.clone(),
                                neighbour: graph.node_name(neighbour).to_string(),
                            });
                        }
                    }
                    NodeKind::Switch { state: SwitchState::Left, head, left, right }
                }
            };
            if let Some(node) = graph.graph.node_weight_mut(index) {
                node.kind = kind;
            }
        }

        for platform in &self.platforms {
            graph.add_platform(&platform.name, &platform.edge)?;
        }

        Ok(graph)
    }
}
