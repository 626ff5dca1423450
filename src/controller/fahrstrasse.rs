use super::{ActiveFahrstrasse, AttemptState, ReservationAttempt, RouteController};
use crate::error::RoutingError;
use crate::interlocking::Interlocking;
use crate::models::{Nodes, RouteId, SignalState, Signals, TrackId, TrainId, Tracks};
use crate::router::{Leg, Router};
use log::{debug, info};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};

impl<I: Interlocking> RouteController<I> {
    /// Set the first fahrstrasse for a train about to be spawned on `start_edge`
    ///
    /// Returns `Ok(None)` when the tracks are in use or the interlocking
    /// refuses the route; the caller retries on a later tick.
    ///
    /// # Errors
    ///
    /// Returns `NoPath`, `NoSignalPair` or `NoInterlockingRoute` when the
    /// topology cannot provide a route at all
    pub fn set_spawn_fahrstrasse(
        &mut self,
        start_edge: EdgeIndex,
        end_edge: EdgeIndex,
    ) -> Result<Option<RouteId>, RoutingError> {
        self.ensure_initialized()?;
        let leg = Router::new(&self.graph).leg_towards(start_edge, end_edge)?;
        let route = self.find_interlocking_route(&leg)?;

        let occupied = leg
            .tracks
            .iter()
            .any(|&id| self.graph.track(id).is_none_or(|t| t.is_reserved() || t.blocked));
        if occupied || !self.interlocking.set_route(&route) {
            debug!("spawn route {route} not available yet");
            return Ok(None);
        }

        self.mirror_route_set(&route);
        self.active_fahrstrassen.insert(route.clone(), ActiveFahrstrasse {
            train: None,
            segments: leg.edges,
            tracks: leg.tracks,
            length: leg.length,
        });
        self.events.create_fahrstrasse(self.tick, &route);
        Ok(Some(route))
    }

    /// Request the next leg when a train reaches the last segment of its active route
    ///
    /// # Errors
    ///
    /// Propagates fatal errors from [`Self::set_fahrstrasse`]
    pub fn maybe_set_fahrstrasse(&mut self, train: TrainId, edge: EdgeIndex) -> Result<(), RoutingError> {
        let Some(current) = self.trains.get(&train) else {
            return Err(RoutingError::UnknownTrain(train));
        };
        if current.has_finished() {
            return Ok(());
        }
        let ends_here = self
            .interlocking
            .active_routes()
            .iter()
            .filter(|route| route.get_last_segment_of_route() == Some(edge))
            .any(|route| {
                self.active_fahrstrassen
                    .get(&route.id)
                    .is_some_and(|f| f.train.is_none_or(|owner| owner == train))
            });
        if ends_here {
            self.set_fahrstrasse(train, edge)?;
        }
        Ok(())
    }

    /// Compute, reserve and try to set the next leg towards the train's next platform
    ///
    /// A leg that cannot be reserved yet is queued for retry. When the rest of
    /// the way to the platform passes no further signal, there is nothing to set.
    ///
    /// # Errors
    ///
    /// Returns `NoPath` if the platform cannot be reached and
    /// `NoInterlockingRoute` if the interlocking has no route for the leg
    pub fn set_fahrstrasse(&mut self, train: TrainId, edge: EdgeIndex) -> Result<(), RoutingError> {
        let target = self
            .trains
            .get(&train)
            .ok_or(RoutingError::UnknownTrain(train))?
            .next_platform()
            .map(|platform| platform.edge);
        let Some(target) = target else {
            return Ok(());
        };

        let leg = match self.planned_legs.remove(&train) {
            Some((from_edge, leg)) if from_edge == edge => leg,
            _ => match Router::new(&self.graph).leg_towards(edge, target) {
                Ok(leg) => leg,
                Err(RoutingError::NoSignalPair { .. }) => {
                    debug!("train {train}: no signal left before {}", self.graph.edge_name(target));
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
        };
        let route = self.find_interlocking_route(&leg)?;

        if let Some(current) = self.trains.get_mut(&train) {
            current.route_id = Some(route.clone());
        }

        let mut attempt = ReservationAttempt {
            train,
            route: leg.nodes,
            interlocking_route: route,
            route_length: leg.length,
            from_edge: edge,
            state: AttemptState::Pending,
        };
        if !self.try_reserving_route(&mut attempt) && attempt.state != AttemptState::RouteSet {
            debug!("train {train}: reservation of {} deferred", attempt.interlocking_route);
            self.routes_to_be_reserved.push(attempt);
        }
        Ok(())
    }

    /// Reserve the attempt's tracks, then try to set its route
    ///
    /// A route set that does not go through is queued on `routes_to_be_set`.
    /// Returns whether the reservation succeeded.
    pub fn try_reserving_route(&mut self, attempt: &mut ReservationAttempt) -> bool {
        let reserved = self.reserve_route(&attempt.route, attempt.train);
        if reserved && attempt.state == AttemptState::Pending {
            attempt.state = AttemptState::Reserved;
        }

        if !self.try_setting_interlocking_route(attempt) {
            let queued = self
                .routes_to_be_set
                .iter()
                .any(|queued| queued.is_for(attempt.train, &attempt.interlocking_route));
            if !queued {
                self.routes_to_be_set.push(attempt.clone());
            }
        }
        reserved
    }

    /// Set the attempt's route once the train heads the queue of every track on it
    pub fn try_setting_interlocking_route(&mut self, attempt: &mut ReservationAttempt) -> bool {
        if attempt.state == AttemptState::RouteSet || self.is_route_set_for(attempt.train, &attempt.interlocking_route) {
            attempt.state = AttemptState::RouteSet;
            return true;
        }

        let Some(tracks) = self.route_tracks(&attempt.route) else {
            return false;
        };
        let owns_all = tracks
            .iter()
            .all(|&id| self.graph.track(id).is_some_and(|t| t.is_head(attempt.train)));
        if !owns_all {
            return false;
        }
        if !self.interlocking.set_route(&attempt.interlocking_route) {
            debug!("interlocking refused {} for train {}", attempt.interlocking_route, attempt.train);
            return false;
        }

        let route = attempt.interlocking_route.clone();
        self.mirror_route_set(&route);
        self.active_fahrstrassen.insert(route.clone(), ActiveFahrstrasse {
            train: Some(attempt.train),
            segments: self.graph.path_edges(&attempt.route).unwrap_or_default(),
            tracks,
            length: attempt.route_length,
        });
        self.events.create_fahrstrasse(self.tick, &route);
        self.events
            .train_enter_block_section(self.tick, attempt.train, &route, attempt.route_length);
        info!("route {route} set for train {}", attempt.train);

        attempt.state = AttemptState::RouteSet;
        self.settle(attempt.train, &route);
        true
    }

    /// Free every active route of `train` whose last segment is `edge`
    pub fn maybe_free_fahrstrasse(&mut self, train: TrainId, edge: EdgeIndex) {
        let ending: Vec<RouteId> = self
            .interlocking
            .active_routes()
            .iter()
            .filter(|route| route.contains_segment(edge).is_some())
            .filter(|route| route.get_last_segment_of_route() == Some(edge))
            .map(|route| route.id.clone())
            .filter(|id| self.active_fahrstrassen.get(id).is_some_and(|f| f.train == Some(train)))
            .collect();
        for route in ending {
            self.free_fahrstrasse(train, &route);
        }
    }

    /// Free a route in the interlocking and leave its block section
    pub fn free_fahrstrasse(&mut self, train: TrainId, route: &RouteId) {
        self.interlocking.free_route(route);
        let start = self.interlocking.route(route).map(|r| r.start_signal);
        if let Some(signal) = start {
            self.graph.set_signal_state(signal, SignalState::Halt);
        }

        let length = self.active_fahrstrassen.shift_remove(route).map_or(0.0, |f| f.length);
        self.events.remove_fahrstrasse(self.tick, route);
        self.events.train_leave_block_section(self.tick, train, route, length);
        info!("route {route} freed by train {train}");
    }

    /// Interlocking route between the leg's signals over exactly the leg's edges
    ///
    /// # Errors
    ///
    /// Returns `NoSignalPair` for a leg without two signals and
    /// `NoInterlockingRoute` if the interlocking knows no route over the leg
    pub fn find_interlocking_route(&self, leg: &Leg) -> Result<RouteId, RoutingError> {
        let (Some(start), Some(end)) = (leg.start_signal(), leg.end_signal()) else {
            let from = leg.edges.first().map_or("?", |&edge| self.graph.edge_name(edge));
            return Err(RoutingError::NoSignalPair { from: from.to_string() });
        };

        self.interlocking
            .routes()
            .iter()
            .find(|route| route.start_signal == start && route.end_signal == end && route.segments == leg.edges)
            .map(|route| route.id.clone())
            .ok_or_else(|| RoutingError::NoInterlockingRoute {
                start: self.graph.node_name(start).to_string(),
                end: self.graph.node_name(end).to_string(),
            })
    }

    pub(super) fn route_tracks(&self, route: &[NodeIndex]) -> Option<Vec<TrackId>> {
        let edges = self.graph.path_edges(route)?;
        self.graph.tracks_of(&edges)
    }

    /// Reflect a newly set route in the topology's signal and switch states
    fn mirror_route_set(&mut self, route: &RouteId) {
        let Some(set) = self.interlocking.route(route) else {
            return;
        };
        let start = set.start_signal;
        let switches = set.switches.clone();
        for (switch, state) in switches {
            self.graph.set_switch_state(switch, state);
        }
        self.graph.set_signal_state(start, SignalState::Go);
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::{AttemptState, ReservationAttempt, RouteController};
    use crate::config::ControllerConfig;
    use crate::error::RoutingError;
    use crate::events::{Event, EventKind};
    use crate::interlocking::{Interlocking, InterlockingRoute};
    use crate::models::{Nodes, RailwayGraph, RouteId, SwitchState, Train, TrainId, Tracks};
    use crate::router::{Leg, Router};
    use crate::test_support::{
        controller_for, edge, event_log, hold, junction_graph, line_graph, loop_graph, node_path, queue,
    };

    /// Interlocking that knows no routes at all
    #[derive(Default)]
    struct EmptyInterlocking;

    impl Interlocking for EmptyInterlocking {
        fn prepare(&mut self, _graph: &RailwayGraph) {}

        fn set_route(&mut self, _route: &RouteId) -> bool {
            false
        }

        fn free_route(&mut self, _route: &RouteId) {}

        fn routes(&self) -> &[InterlockingRoute] {
            &[]
        }

        fn active_routes(&self) -> Vec<&InterlockingRoute> {
            Vec::new()
        }
    }

    fn attempt(controller: &RouteController, train: TrainId, nodes: &[&str], route: &str) -> ReservationAttempt {
        ReservationAttempt {
            train,
            route: node_path(&controller.graph, nodes),
            interlocking_route: RouteId::from(route),
            route_length: 400.0,
            from_edge: edge(&controller.graph, "t1"),
            state: AttemptState::Pending,
        }
    }

    #[test]
    fn test_double_spawn_returns_none() {
        let mut controller = controller_for(line_graph());
        let t1 = edge(&controller.graph, "t1");
        let t7 = edge(&controller.graph, "t7");

        let first = controller.set_spawn_fahrstrasse(t1, t7).expect("routable");
        let second = controller.set_spawn_fahrstrasse(t1, t7).expect("routable");

        assert_eq!(first, Some(RouteId::from("S1-S2")));
        assert_eq!(second, None);
    }

    #[test]
    fn test_spawn_without_path_is_fatal() {
        let mut controller = controller_for(line_graph());
        let t4 = edge(&controller.graph, "t4");
        let t1 = edge(&controller.graph, "t1");

        assert!(matches!(controller.set_spawn_fahrstrasse(t4, t1), Err(RoutingError::NoPath { .. })));
    }

    #[test]
    fn test_missing_interlocking_route_is_fatal() {
        let mut graph = line_graph();
        let t1 = graph.edge_index("t1").expect("edge");
        let t4 = graph.edge_index("t4").expect("edge");
        let mut controller = RouteController::new(graph, EmptyInterlocking, ControllerConfig::default());

        let result = controller.set_spawn_fahrstrasse(t1, t4);
        assert!(matches!(
            result,
            Err(RoutingError::NoInterlockingRoute { ref start, ref end }) if start == "S1" && end == "S2"
        ));
    }

    #[test]
    fn test_leg_must_match_route_edges_exactly() {
        let mut controller = controller_for(loop_graph());
        controller.ensure_initialized().expect("init");
        let a = edge(&controller.graph, "a");
        let xs = edge(&controller.graph, "xs");
        let mut leg = Router::new(&controller.graph).leg_towards(a, xs).expect("routable");

        assert_eq!(controller.find_interlocking_route(&leg).ok(), Some(RouteId::from("SA-SX")));

        // Same signals, but the edges diverge from every generated route
        leg.edges.pop();
        assert!(matches!(
            controller.find_interlocking_route(&leg),
            Err(RoutingError::NoInterlockingRoute { ref start, ref end }) if start == "SA" && end == "SX"
        ));
    }

    #[test]
    fn test_leg_without_signals_names_its_edge() {
        let controller = controller_for(loop_graph());
        let h = edge(&controller.graph, "h");
        let leg = Leg { nodes: Vec::new(), edges: vec![h], tracks: Vec::new(), length: 50.0 };

        assert!(matches!(
            controller.find_interlocking_route(&leg),
            Err(RoutingError::NoSignalPair { ref from }) if from == "h"
        ));
    }

    #[test]
    fn test_spawn_sets_switches_and_signal() {
        let mut controller = controller_for(junction_graph());
        let a = edge(&controller.graph, "a");
        let rs = edge(&controller.graph, "rs");

        let route = controller.set_spawn_fahrstrasse(a, rs).expect("routable");
        assert_eq!(route, Some(RouteId::from("SA-SR")));

        let switch = controller.graph.node_index("W").expect("node");
        let state = match controller.graph.node(switch).map(|n| &n.kind) {
            Some(crate::models::NodeKind::Switch { state, .. }) => Some(*state),
            _ => None,
        };
        assert_eq!(state, Some(SwitchState::Right));
    }

    #[test]
    fn test_route_set_needs_head_of_every_queue() {
        let mut controller = controller_for(line_graph());
        controller.ensure_initialized().expect("init");
        let events = event_log(&mut controller);
        controller.add_train(Train::new(TrainId(1), vec![]));
        controller.add_train(Train::new(TrainId(2), vec![]));
        let nodes = ["S1", "W1", "B", "S2"];

        // Train 1 reserved first but has not set its route yet
        let mut first = attempt(&controller, TrainId(1), &nodes, "S1-S2");
        assert!(controller.reserve_route(&first.route, TrainId(1)));

        let mut second = attempt(&controller, TrainId(2), &nodes, "S1-S2");
        assert!(controller.try_reserving_route(&mut second));
        assert_eq!(second.state, AttemptState::Reserved);
        assert_eq!(controller.routes_to_be_set().len(), 1);

        assert!(controller.try_setting_interlocking_route(&mut first));
        assert_eq!(first.state, AttemptState::RouteSet);
        assert_eq!(
            events.borrow().first(),
            Some(&Event::CreateFahrstrasse { tick: 0, route: RouteId::from("S1-S2") })
        );

        // Train 2 stays queued while train 1 heads the tracks
        controller.next_tick(1).expect("tick");
        assert_eq!(controller.routes_to_be_set().len(), 1);
    }

    #[test]
    fn test_follow_scenario_sets_only_after_leader_moves_on() {
        let mut controller = controller_for(line_graph());
        controller.ensure_initialized().expect("init");
        controller.add_train(Train::new(TrainId(1), vec![]));
        controller.add_train(Train::new(TrainId(2), vec![]));
        hold(&mut controller, TrainId(1), &["t2", "t3", "t4"]);

        // Train 1 has moved past t2
        let t2 = edge(&controller.graph, "t2");
        let track = controller.graph.track_of(t2).expect("track");
        controller.graph.release(track, TrainId(1));
        controller.trains[&TrainId(1)].release_track(track);

        let short = node_path(&controller.graph, &["S1", "W1"]);
        assert!(controller.reserve_route(&short, TrainId(2)));
        assert_eq!(queue(&controller, "t2"), vec![TrainId(2)]);

        let mut next = attempt(&controller, TrainId(2), &["S1", "W1", "B", "S2"], "S1-S2");
        assert!(controller.try_reserving_route(&mut next));
        assert!(!controller.interlocking.is_active(&RouteId::from("S1-S2")));
        assert_eq!(controller.routes_to_be_set().len(), 1);

        for name in ["t3", "t4"] {
            let track = controller.graph.track_of(edge(&controller.graph, name)).expect("track");
            controller.graph.release(track, TrainId(1));
        }
        controller.next_tick(1).expect("tick");

        assert!(controller.interlocking.is_active(&RouteId::from("S1-S2")));
        assert!(controller.routes_to_be_set().is_empty());
    }

    #[test]
    fn test_retried_entry_is_removed_once() {
        let mut controller = controller_for(line_graph());
        controller.ensure_initialized().expect("init");
        let events = event_log(&mut controller);
        controller.add_train(Train::new(TrainId(1), vec![]));
        controller.add_train(Train::new(TrainId(2), vec![]));
        hold(&mut controller, TrainId(1), &["t4"]);

        let mut waiting = attempt(&controller, TrainId(2), &["S1", "W1", "B", "S2"], "S1-S2");
        assert!(controller.try_reserving_route(&mut waiting));

        for tick in 1..=3 {
            controller.next_tick(tick).expect("tick");
            assert_eq!(controller.routes_to_be_set().len(), 1);
        }

        let t4 = controller.graph.track_of(edge(&controller.graph, "t4")).expect("track");
        controller.graph.release(t4, TrainId(1));
        controller.next_tick(4).expect("tick");
        controller.next_tick(5).expect("tick");

        assert!(controller.routes_to_be_set().is_empty());
        let created = events
            .borrow()
            .iter()
            .filter(|event| event.kind() == EventKind::CreateFahrstrasse)
            .count();
        assert_eq!(created, 1);
        assert_eq!(events.borrow()[0].tick(), 4);
    }

    #[test]
    fn test_mutual_exclusion_between_trains() {
        let mut controller = controller_for(line_graph());
        controller.ensure_initialized().expect("init");
        controller.add_train(Train::new(TrainId(1), vec![]));
        controller.add_train(Train::new(TrainId(2), vec![]));
        let nodes = ["S1", "W1", "B", "S2"];

        let mut first = attempt(&controller, TrainId(1), &nodes, "S1-S2");
        let mut second = attempt(&controller, TrainId(2), &nodes, "S1-S2");
        controller.try_reserving_route(&mut first);
        controller.try_reserving_route(&mut second);
        controller.next_tick(1).expect("tick");

        assert_eq!(first.state, AttemptState::RouteSet);
        assert_ne!(second.state, AttemptState::RouteSet);
        let owners: Vec<_> = controller.active_fahrstrassen().values().map(|f| f.train).collect();
        assert_eq!(owners, vec![Some(TrainId(1))]);
        for track in &controller.graph.tracks {
            assert!(track.reservations.iter().take(1).all(|r| r.train == TrainId(1)));
        }
    }

    #[test]
    fn test_leaving_last_segment_frees_route() {
        let mut controller = controller_for(line_graph());
        let events = event_log(&mut controller);
        let t1 = edge(&controller.graph, "t1");
        let t4 = edge(&controller.graph, "t4");
        let route = controller.set_spawn_fahrstrasse(t1, t4).expect("routable").expect("route free");
        controller.add_train(Train::new(TrainId(1), vec![]).with_route(route.clone()));

        controller.maybe_free_fahrstrasse(TrainId(1), edge(&controller.graph, "t3"));
        assert!(controller.interlocking.is_active(&route));

        controller.maybe_free_fahrstrasse(TrainId(1), t4);
        assert!(!controller.interlocking.is_active(&route));
        assert_eq!(
            events.borrow().last(),
            Some(&Event::TrainLeaveBlockSection {
                tick: 0,
                train: TrainId(1),
                block_section: route,
                length: 400.0,
            })
        );
    }
}
