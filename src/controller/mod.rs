//! Route controller: decides which train may use which track and when its
//! next fahrstrasse is requested from the interlocking.
//!
//! Driven once per tick through [`RouteController::next_tick`] and by the
//! physical bridge through the enter/leave edge hooks. Contention is never an
//! error: reservation and route-set attempts that do not go through are kept
//! in two retry queues and retried every tick.

mod fahrstrasse;
mod faults;
mod reservation;

pub use faults::TrackFault;

use crate::config::ControllerConfig;
use crate::error::RoutingError;
use crate::events::EventBus;
use crate::interlocking::{Interlocking, RouteTableInterlocking};
use crate::models::{Nodes, RailwayGraph, RouteId, Signals, TrackId, Train, TrainId, Tracks};
use crate::router::Leg;
use indexmap::IndexMap;
use log::{debug, info, warn};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Pending,
    /// Tracks are reserved, the interlocking has not set the route yet
    Reserved,
    RouteSet,
}

/// A leg waiting for its reservation or its route to be set
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationAttempt {
    pub train: TrainId,
    /// Start signal to end signal
    pub route: Vec<NodeIndex>,
    pub interlocking_route: RouteId,
    pub route_length: f64,
    /// Edge the train was on when the leg was requested
    pub from_edge: EdgeIndex,
    pub state: AttemptState,
}

impl ReservationAttempt {
    fn is_for(&self, train: TrainId, route: &RouteId) -> bool {
        self.train == train && &self.interlocking_route == route
    }
}

/// A route currently set in the interlocking
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveFahrstrasse {
    /// `None` for a spawn route until the spawned train is added
    pub train: Option<TrainId>,
    pub segments: Vec<EdgeIndex>,
    pub tracks: Vec<TrackId>,
    pub length: f64,
}

pub struct RouteController<I: Interlocking = RouteTableInterlocking> {
    pub graph: RailwayGraph,
    pub trains: IndexMap<TrainId, Train>,
    pub interlocking: I,
    pub events: EventBus,
    config: ControllerConfig,
    tick: u64,
    initialized: bool,
    routes_to_be_set: Vec<ReservationAttempt>,
    routes_to_be_reserved: Vec<ReservationAttempt>,
    active_fahrstrassen: IndexMap<RouteId, ActiveFahrstrasse>,
    /// Legs reserved on a train's behalf by chain extension, keyed by the edge they start from
    planned_legs: HashMap<TrainId, (EdgeIndex, Leg)>,
}

impl<I: Interlocking> RouteController<I> {
    #[must_use]
    pub fn new(graph: RailwayGraph, interlocking: I, config: ControllerConfig) -> Self {
        Self {
            graph,
            trains: IndexMap::new(),
            interlocking,
            events: EventBus::new(),
            config,
            tick: 0,
            initialized: false,
            routes_to_be_set: Vec::new(),
            routes_to_be_reserved: Vec::new(),
            active_fahrstrassen: IndexMap::new(),
            planned_legs: HashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn routes_to_be_set(&self) -> &[ReservationAttempt] {
        &self.routes_to_be_set
    }

    #[must_use]
    pub fn routes_to_be_reserved(&self) -> &[ReservationAttempt] {
        &self.routes_to_be_reserved
    }

    #[must_use]
    pub fn active_fahrstrassen(&self) -> &IndexMap<RouteId, ActiveFahrstrasse> {
        &self.active_fahrstrassen
    }

    /// Resolve signal directions and build the interlocking's route table, once
    ///
    /// # Errors
    ///
    /// Returns a topology error if a signal's approach node is not adjacent to it
    pub fn ensure_initialized(&mut self) -> Result<(), RoutingError> {
        if self.initialized {
            return Ok(());
        }
        let signals = self.graph.initialize_signals()?;
        self.interlocking.prepare(&self.graph);
        self.initialized = true;
        info!(
            "route controller initialized: {signals} signals, {} interlocking routes",
            self.interlocking.routes().len()
        );
        Ok(())
    }

    /// Per-tick callback: retry deferred route sets, then deferred reservations
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails on the first tick
    pub fn next_tick(&mut self, tick: u64) -> Result<(), RoutingError> {
        self.tick = tick;
        self.ensure_initialized()?;

        if self.routes_to_be_set.is_empty() && self.routes_to_be_reserved.is_empty() {
            return Ok(());
        }
        debug!(
            "tick {tick}: retrying {} route sets and {} reservations",
            self.routes_to_be_set.len(),
            self.routes_to_be_reserved.len()
        );

        let pending = std::mem::take(&mut self.routes_to_be_set);
        let mut waiting = Vec::new();
        for mut attempt in pending {
            if !self.trains.contains_key(&attempt.train) {
                continue;
            }
            if !self.try_setting_interlocking_route(&mut attempt) {
                waiting.push(attempt);
            }
        }
        waiting.append(&mut self.routes_to_be_set);
        self.routes_to_be_set = waiting;

        let pending = std::mem::take(&mut self.routes_to_be_reserved);
        let mut waiting = Vec::new();
        for mut attempt in pending {
            if !self.trains.contains_key(&attempt.train)
                || self.is_route_set_for(attempt.train, &attempt.interlocking_route)
            {
                continue;
            }
            if !self.try_reserving_route(&mut attempt) {
                waiting.push(attempt);
            }
        }
        waiting.append(&mut self.routes_to_be_reserved);
        self.routes_to_be_reserved = waiting;

        Ok(())
    }

    /// Register a spawned train
    ///
    /// A train carrying the id of an unclaimed spawn route takes it over: the
    /// route's tracks are reserved for it and it enters that block section.
    pub fn add_train(&mut self, train: Train) {
        let id = train.id;
        let spawn_route = train.route_id.clone();
        if self.trains.insert(id, train).is_some() {
            warn!("train {id} was added twice, replacing it");
        }

        let Some(route) = spawn_route else {
            return;
        };
        let Some(fahrstrasse) = self.active_fahrstrassen.get_mut(&route) else {
            return;
        };
        if fahrstrasse.train.is_some() {
            return;
        }
        fahrstrasse.train = Some(id);
        let segments = fahrstrasse.segments.clone();
        let length = fahrstrasse.length;

        for edge in segments {
            let Some(track) = self.graph.track_of(edge) else {
                continue;
            };
            self.commit_reservation(id, edge, track);
        }
        self.events.train_enter_block_section(self.tick, id, &route, length);
        info!("train {id} spawned on route {route}");
    }

    /// Remove a train that left the simulation, releasing everything it holds
    ///
    /// # Errors
    ///
    /// Returns `UnknownTrain` if the train is not registered
    pub fn remove_train(&mut self, id: TrainId) -> Result<Train, RoutingError> {
        let owned: Vec<RouteId> = self
            .active_fahrstrassen
            .iter()
            .filter(|(_, f)| f.train == Some(id))
            .map(|(route, _)| route.clone())
            .collect();
        for route in owned {
            self.free_fahrstrasse(id, &route);
        }

        let mut train = self.trains.shift_remove(&id).ok_or(RoutingError::UnknownTrain(id))?;
        for track in train.reserved_tracks.drain(..) {
            self.graph.release(track, id);
        }
        self.routes_to_be_set.retain(|attempt| attempt.train != id);
        self.routes_to_be_reserved.retain(|attempt| attempt.train != id);
        self.planned_legs.remove(&id);

        info!("train {id} removed");
        Ok(train)
    }

    /// The physical bridge reports that a train entered an edge
    ///
    /// # Errors
    ///
    /// Returns `UnknownTrain`, or a fatal routing error from requesting the next leg
    pub fn on_train_enter_edge(&mut self, id: TrainId, edge: EdgeIndex) -> Result<(), RoutingError> {
        let train = self.trains.get_mut(&id).ok_or(RoutingError::UnknownTrain(id))?;
        train.current_edge = Some(edge);
        if train.arrive(edge) {
            info!("train {id} reached platform on {}", self.graph.edge_name(edge));
        }
        self.maybe_set_fahrstrasse(id, edge)
    }

    /// The physical bridge reports that a train left an edge
    ///
    /// # Errors
    ///
    /// Returns `UnknownTrain` if the train is not registered
    pub fn on_train_leave_edge(&mut self, id: TrainId, edge: EdgeIndex) -> Result<(), RoutingError> {
        if !self.trains.contains_key(&id) {
            return Err(RoutingError::UnknownTrain(id));
        }
        self.maybe_free_fahrstrasse(id, edge);

        if self.config.release_on_leave {
            if let Some(track) = self.graph.track_of(edge) {
                self.graph.release(track, id);
                if let Some(train) = self.trains.get_mut(&id) {
                    train.release_track(track);
                }
            }
        }
        Ok(())
    }

    fn is_route_set_for(&self, train: TrainId, route: &RouteId) -> bool {
        self.active_fahrstrassen
            .get(route)
            .is_some_and(|f| f.train == Some(train))
    }

    /// Drop every queued attempt of `train` for `route`
    fn settle(&mut self, train: TrainId, route: &RouteId) {
        self.routes_to_be_set.retain(|attempt| !attempt.is_for(train, route));
        self.routes_to_be_reserved.retain(|attempt| !attempt.is_for(train, route));
    }
}
