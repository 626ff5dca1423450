use super::InterlockingRoute;
use crate::models::{Nodes, RailwayGraph, RouteId, Signals, SwitchState, Tracks};
use log::debug;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use std::collections::HashMap;

/// Partial route on the search stack
#[derive(Debug, Clone)]
struct SearchPath {
    edges: Vec<EdgeIndex>,
    switches: Vec<(NodeIndex, SwitchState)>,
    length: f64,
}

/// Enumerate every route from a signal to the next signal facing the same way
///
/// The search starts on each signal's incoming edge and follows the switch
/// geometry until it reaches a facing signal. Paths never visit an edge twice.
/// Signals must be initialized first; uninitialized signals start no routes.
/// Routes are named `START-END`, further routes between the same pair get
/// `#2`, `#3` and so on in discovery order.
#[must_use]
pub fn generate_routes(graph: &RailwayGraph) -> Vec<InterlockingRoute> {
    let mut routes = Vec::new();
    let mut per_pair: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();

    let mut signals: Vec<(NodeIndex, EdgeIndex)> = graph
        .graph
        .node_indices()
        .filter_map(|index| Some((index, graph.node(index)?.signal_incoming()?)))
        .collect();
    signals.sort_by(|a, b| graph.node_name(a.0).cmp(graph.node_name(b.0)));

    for (start_signal, incoming) in signals {
        let mut stack = vec![SearchPath { edges: Vec::new(), switches: Vec::new(), length: 0.0 }];

        while let Some(path) = stack.pop() {
            let last = path.edges.last().copied().unwrap_or(incoming);
            let mut next_edges = graph.successors(last);
            // Reverse so the stack yields successors in graph order
            next_edges.reverse();

            for next in next_edges {
                if next == incoming || path.edges.contains(&next) {
                    continue;
                }
                let Some((via, target)) = graph.edge_endpoints(next) else {
                    continue;
                };
                let Some(edge) = graph.edge(next) else {
                    continue;
                };

                let mut extended = path.clone();
                if let Some(state) = graph
                    .edge_endpoints(last)
                    .and_then(|(from, _)| graph.node(via)?.required_switch_state(from, target))
                {
                    extended.switches.push((via, state));
                }
                extended.edges.push(next);
                extended.length += edge.length;

                if graph.is_facing_signal(target, next) {
                    let count = per_pair.entry((start_signal, target)).or_insert(0);
                    *count += 1;
                    let base = format!("{}-{}", graph.node_name(start_signal), graph.node_name(target));
                    let id = if *count == 1 { base } else { format!("{base}#{count}") };

                    debug!("generated route {id} over {} segments", extended.edges.len());
                    routes.push(InterlockingRoute {
                        id: RouteId(id),
                        start_signal,
                        end_signal: target,
                        tracks: graph.tracks_of(&extended.edges).unwrap_or_default(),
                        segments: extended.edges,
                        switches: extended.switches,
                        length: extended.length,
                    });
                } else {
                    stack.push(extended);
                }
            }
        }
    }

    routes
}
