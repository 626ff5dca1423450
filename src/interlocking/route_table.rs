use super::{generate_routes, Interlocking, InterlockingRoute};
use crate::infrastructure::InfrastructureProvider;
use crate::models::{Nodes, RailwayGraph, RouteId, SignalState};
use indexmap::IndexSet;
use log::{debug, info, warn};
use petgraph::stable_graph::NodeIndex;
use std::collections::HashMap;

/// Interlocking working off a generated route table
///
/// A route can be set when it is not active and shares no track and no
/// switch with an active route. Setting a route turns its switches and clears
/// its start signal through every provider; freeing it puts the start signal
/// back to Halt.
#[derive(Default)]
pub struct RouteTableInterlocking {
    routes: Vec<InterlockingRoute>,
    active: IndexSet<RouteId>,
    node_names: HashMap<NodeIndex, String>,
    providers: Vec<Box<dyn InfrastructureProvider>>,
}

impl RouteTableInterlocking {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(&mut self, provider: Box<dyn InfrastructureProvider>) {
        self.providers.push(provider);
    }

    fn name(&self, node: NodeIndex) -> &str {
        self.node_names.get(&node).map_or("?", String::as_str)
    }
}

impl Interlocking for RouteTableInterlocking {
    fn prepare(&mut self, graph: &RailwayGraph) {
        self.routes = generate_routes(graph);
        self.active.clear();
        self.node_names = graph
            .graph
            .node_indices()
            .map(|index| (index, graph.node_name(index).to_string()))
            .collect();
        info!("interlocking prepared with {} routes", self.routes.len());
    }

    fn set_route(&mut self, id: &RouteId) -> bool {
        if self.active.contains(id) {
            debug!("route {id} is already set");
            return false;
        }
        let Some(route) = self.routes.iter().find(|route| &route.id == id) else {
            warn!("set_route for unknown route {id}");
            return false;
        };

        let conflicting = self
            .active
            .iter()
            .filter_map(|active| self.routes.iter().find(|r| &r.id == active))
            .find(|active| active.conflicts_with(route));
        if let Some(other) = conflicting {
            debug!("route {id} conflicts with active route {}", other.id);
            return false;
        }

        let switches: Vec<_> = route
            .switches
            .iter()
            .map(|&(switch, state)| (self.name(switch).to_string(), state))
            .collect();
        let signal = self.name(route.start_signal).to_string();

        for provider in &mut self.providers {
            for (switch, state) in &switches {
                provider.turn_switch(switch, *state);
            }
            provider.set_signal_state(&signal, SignalState::Go);
        }

        self.active.insert(id.clone());
        true
    }

    fn free_route(&mut self, id: &RouteId) {
        if !self.active.shift_remove(id) {
            return;
        }
        let Some(route) = self.routes.iter().find(|route| &route.id == id) else {
            return;
        };
        let signal = self.name(route.start_signal).to_string();
        for provider in &mut self.providers {
            provider.set_signal_state(&signal, SignalState::Halt);
        }
    }

    fn routes(&self) -> &[InterlockingRoute] {
        &self.routes
    }

    fn active_routes(&self) -> Vec<&InterlockingRoute> {
        self.active
            .iter()
            .filter_map(|id| self.routes.iter().find(|route| &route.id == id))
            .collect()
    }
}
