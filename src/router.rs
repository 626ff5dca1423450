//! Shortest paths over the railway graph and their signal-to-signal legs.
//!
//! The search runs over directed edges rather than nodes so that trains never
//! reverse and switches are only passed head to leg or leg to head. Blocked
//! tracks are never entered. Opposing traffic is not considered here; the
//! reservation protocol deals with it.

use crate::error::RoutingError;
use crate::models::{Nodes, RailwayGraph, Signals, TrackId, Tracks};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

/// Path length usable as a heap key
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One signal-to-signal section of a path: the extent of a single fahrstrasse
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    /// Start signal, intermediate nodes and end signal
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    pub tracks: Vec<TrackId>,
    pub length: f64,
}

impl Leg {
    #[must_use]
    pub fn start_signal(&self) -> Option<NodeIndex> {
        self.nodes.first().copied()
    }

    #[must_use]
    pub fn end_signal(&self) -> Option<NodeIndex> {
        self.nodes.last().copied()
    }
}

pub struct Router<'a> {
    graph: &'a RailwayGraph,
}

impl<'a> Router<'a> {
    #[must_use]
    pub fn new(graph: &'a RailwayGraph) -> Self {
        Self { graph }
    }

    /// Nodes from the node after `start` to the node after `end`
    ///
    /// # Errors
    ///
    /// Returns `NoPath` if `end` cannot be reached from `start` in the
    /// direction of travel
    pub fn get_route(&self, start: EdgeIndex, end: EdgeIndex) -> Result<Vec<NodeIndex>, RoutingError> {
        let edges = self.get_edge_route(start, end)?;
        edges
            .iter()
            .map(|&edge| {
                self.graph
                    .edge_endpoints(edge)
                    .map(|(_, to)| to)
                    .ok_or_else(|| self.no_path(start, end))
            })
            .collect()
    }

    /// Edges from `start` to `end`, both included
    ///
    /// # Errors
    ///
    /// Returns `NoPath` if `end` cannot be reached from `start`
    pub fn get_edge_route(&self, start: EdgeIndex, end: EdgeIndex) -> Result<Vec<EdgeIndex>, RoutingError> {
        if self.graph.edge(start).is_none() || self.graph.edge(end).is_none() {
            return Err(self.no_path(start, end));
        }
        if start == end {
            return Ok(vec![start]);
        }

        // dist[e] = best known length to the end of edge e, not counting `start`
        let mut dist: HashMap<EdgeIndex, f64> = HashMap::new();
        let mut prev: HashMap<EdgeIndex, EdgeIndex> = HashMap::new();
        let mut heap = BinaryHeap::new();

        dist.insert(start, 0.0);
        heap.push(Reverse((Cost(0.0), start)));

        while let Some(Reverse((Cost(cost), edge))) = heap.pop() {
            if edge == end {
                return Ok(reconstruct(&prev, start, end));
            }

            // Stale heap entry
            if dist.get(&edge).is_some_and(|&best| cost > best) {
                continue;
            }

            for next in self.graph.successors(edge) {
                if self.is_blocked(next) {
                    continue;
                }
                let length = self.graph.edge(next).map_or(0.0, |e| e.length);
                let new_cost = cost + length;

                if dist.get(&next).is_none_or(|&best| new_cost < best) {
                    dist.insert(next, new_cost);
                    prev.insert(next, edge);
                    heap.push(Reverse((Cost(new_cost), next)));
                }
            }
        }

        Err(self.no_path(start, end))
    }

    /// First leg of a path: from the first signal facing the train to the next one
    ///
    /// `arriving` is the edge the train reaches `path[0]` on. The leg length is
    /// accumulated hop by hop from the start signal.
    ///
    /// # Errors
    ///
    /// Returns `NoSignalPair` if the path passes fewer than two facing signals
    pub fn first_leg(&self, arriving: EdgeIndex, path: &[NodeIndex]) -> Result<Leg, RoutingError> {
        let mut arriving_edge = arriving;
        let mut start: Option<usize> = None;
        let mut length = 0.0;

        for (position, &node) in path.iter().enumerate() {
            if position > 0 {
                arriving_edge = self
                    .graph
                    .edge_between(path[position - 1], node)
                    .ok_or_else(|| RoutingError::NoSignalPair { from: self.graph.edge_name(arriving).to_string() })?;
                if start.is_some() {
                    length += self.graph.edge(arriving_edge).map_or(0.0, |e| e.length);
                }
            }

            if !self.graph.is_facing_signal(node, arriving_edge) {
                continue;
            }
            let Some(first) = start else {
                start = Some(position);
                continue;
            };

            let nodes = path[first..=position].to_vec();
            let edges = self.graph.path_edges(&nodes).unwrap_or_default();
            let tracks = self.graph.tracks_of(&edges).unwrap_or_default();
            return Ok(Leg { nodes, edges, tracks, length });
        }

        Err(RoutingError::NoSignalPair { from: self.graph.edge_name(arriving).to_string() })
    }

    /// Route from `start` towards `target` and cut out its first leg
    ///
    /// # Errors
    ///
    /// Returns `NoPath` or `NoSignalPair`
    pub fn leg_towards(&self, start: EdgeIndex, target: EdgeIndex) -> Result<Leg, RoutingError> {
        let path = self.get_route(start, target)?;
        self.first_leg(start, &path)
    }

    fn is_blocked(&self, edge: EdgeIndex) -> bool {
        self.graph
            .track_of(edge)
            .and_then(|id| self.graph.track(id))
            .is_some_and(|track| track.blocked)
    }

    fn no_path(&self, start: EdgeIndex, end: EdgeIndex) -> RoutingError {
        RoutingError::NoPath {
            from: self.graph.edge_name(start).to_string(),
            to: self.graph.edge_name(end).to_string(),
        }
    }
}

fn reconstruct(prev: &HashMap<EdgeIndex, EdgeIndex>, start: EdgeIndex, end: EdgeIndex) -> Vec<EdgeIndex> {
    let mut edges = vec![end];
    let mut current = end;
    while current != start {
        let Some(&before) = prev.get(&current) else {
            break;
        };
        edges.push(before);
        current = before;
    }
    edges.reverse();
    edges
}
