mod route_table;
mod routes;

pub use route_table::RouteTableInterlocking;
pub use routes::generate_routes;

use crate::models::{RailwayGraph, RouteId, SwitchState, TrackId};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};

/// Signal-to-signal route known to the interlocking
#[derive(Debug, Clone, PartialEq)]
pub struct InterlockingRoute {
    pub id: RouteId,
    pub start_signal: NodeIndex,
    pub end_signal: NodeIndex,
    /// Edges covered, in travel order
    pub segments: Vec<EdgeIndex>,
    pub tracks: Vec<TrackId>,
    /// Position each switch on the route has to be in
    pub switches: Vec<(NodeIndex, SwitchState)>,
    pub length: f64,
}

impl InterlockingRoute {
    #[must_use]
    pub fn get_last_segment_of_route(&self) -> Option<EdgeIndex> {
        self.segments.last().copied()
    }

    #[must_use]
    pub fn contains_segment(&self, segment: EdgeIndex) -> Option<&Self> {
        self.segments.contains(&segment).then_some(self)
    }

    /// Two routes conflict when they share a track or a switch
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.tracks.iter().any(|track| other.tracks.contains(track))
            || self
                .switches
                .iter()
                .any(|(switch, _)| other.switches.iter().any(|(o, _)| o == switch))
    }
}

/// The interlocking engine seen from the route controller
pub trait Interlocking {
    /// Build the route table for a topology
    fn prepare(&mut self, graph: &RailwayGraph);

    /// Lock a route; false if it is active or conflicts with an active route
    fn set_route(&mut self, route: &RouteId) -> bool;

    fn free_route(&mut self, route: &RouteId);

    fn routes(&self) -> &[InterlockingRoute];

    fn active_routes(&self) -> Vec<&InterlockingRoute>;

    fn route(&self, id: &RouteId) -> Option<&InterlockingRoute> {
        self.routes().iter().find(|route| &route.id == id)
    }

    fn is_active(&self, id: &RouteId) -> bool {
        self.active_routes().iter().any(|route| &route.id == id)
    }
}
