mod nodes;
mod signals;
mod tracks;

pub use nodes::Nodes;
pub use signals::Signals;
pub use tracks::Tracks;

use super::id::TrackId;
use super::node::Node;
use super::station::Platform;
use super::track::{Edge, Track, TrackDirection};
use crate::error::TopologyError;
use indexmap::IndexMap;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use std::collections::{HashMap, VecDeque};

/// Topology arena
///
/// Nodes and directed edges live in the petgraph graph, tracks in `tracks`
/// indexed by `TrackId`. The structure is fixed after loading; only the
/// track state (reservations, `blocked`, `max_speed`) and node aspects change.
#[derive(Debug, Clone, Default)]
pub struct RailwayGraph {
    pub graph: StableDiGraph<Node, Edge>,
    pub tracks: Vec<Track>,
    pub node_name_to_index: HashMap<String, NodeIndex>,
    pub edge_name_to_index: HashMap<String, EdgeIndex>,
    pub platforms: IndexMap<String, Platform>,
}

impl RailwayGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, failing on duplicate names
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNode` if a node with the same name exists
    pub fn add_node(&mut self, node: Node) -> Result<NodeIndex, TopologyError> {
        if self.node_name_to_index.contains_key(&node.name) {
            return Err(TopologyError::DuplicateNode(node.name));
        }
        let name = node.name.clone();
        let index = self.graph.add_node(node);
        self.node_name_to_index.insert(name, index);
        Ok(index)
    }

    /// Add a track between two nodes as a pair of opposing edges
    ///
    /// The forward edge is named `name`, the backward edge `name` + `reverse_suffix`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTrack` if either edge name is taken
    pub fn add_track(
        &mut self,
        name: &str,
        from: NodeIndex,
        to: NodeIndex,
        length: f64,
        max_speed: f64,
        reverse_suffix: &str,
    ) -> Result<TrackId, TopologyError> {
        let reverse_name = format!("{name}{reverse_suffix}");
        if self.edge_name_to_index.contains_key(name) || self.edge_name_to_index.contains_key(&reverse_name) {
            return Err(TopologyError::DuplicateTrack(name.to_string()));
        }

        let id = TrackId(self.tracks.len());
        let forward = self.graph.add_edge(from, to, Edge {
            name: name.to_string(),
            track: id,
            direction: TrackDirection::Forward,
            length,
            max_speed,
        });
        let backward = self.graph.add_edge(to, from, Edge {
            name: reverse_name.clone(),
            track: id,
            direction: TrackDirection::Backward,
            length,
            max_speed,
        });
        self.edge_name_to_index.insert(name.to_string(), forward);
        self.edge_name_to_index.insert(reverse_name, backward);

        self.tracks.push(Track {
            id,
            name: name.to_string(),
            forward,
            backward,
            length,
            max_speed,
            blocked: false,
            reservations: VecDeque::new(),
        });
        Ok(id)
    }

    /// Register a platform on an existing edge
    ///
    /// # Errors
    ///
    /// Returns `UnknownEdge` if the edge does not exist
    pub fn add_platform(&mut self, name: &str, edge_name: &str) -> Result<(), TopologyError> {
        let edge = self.edge_index(edge_name)?;
        self.platforms.insert(name.to_string(), Platform::new(name, edge));
        Ok(())
    }

    /// Look up a platform by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownPlatform` if no such platform exists
    pub fn platform(&self, name: &str) -> Result<&Platform, TopologyError> {
        self.platforms
            .get(name)
            .ok_or_else(|| TopologyError::UnknownPlatform(name.to_string()))
    }

    /// Look up an edge by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownEdge` if no such edge exists
    pub fn edge_index(&self, name: &str) -> Result<EdgeIndex, TopologyError> {
        self.edge_name_to_index
            .get(name)
            .copied()
            .ok_or_else(|| TopologyError::UnknownEdge(name.to_string()))
    }

    /// Look up a node by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` if no such node exists
    pub fn node_index(&self, name: &str) -> Result<NodeIndex, TopologyError> {
        self.node_name_to_index
            .get(name)
            .copied()
            .ok_or_else(|| TopologyError::UnknownNode(name.to_string()))
    }
}
