//! Tick loop standing in for the physical bridge and the spawner.
//!
//! Trains move one edge per tick, only onto segments of routes the
//! interlocking has set for them. Past the last signal before their final
//! platform they run on sight as long as the track ahead is not held by
//! another train.

use crate::error::RunnerError;
use crate::scenario::{FaultSpec, Scenario, SpawnSpec};
use log::{info, warn};
use route_control::events::{Event, EventKind};
use route_control::infrastructure::LoggingProvider;
use route_control::interlocking::RouteTableInterlocking;
use route_control::models::{Nodes, Platform, Train, TrainId, Tracks};
use route_control::router::Router;
use route_control::{ControllerConfig, EdgeIndex, RouteController, RoutingError};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub ticks: u64,
    pub spawned: usize,
    pub finished: usize,
    pub fahrstrassen_set: usize,
    pub fahrstrassen_freed: usize,
}

pub struct Simulation {
    controller: RouteController,
    spawns: Vec<SpawnSpec>,
    faults: Vec<FaultSpec>,
    summary: Rc<RefCell<Summary>>,
}

impl Simulation {
    pub fn new(scenario: Scenario, config: ControllerConfig) -> Result<Self, RunnerError> {
        let graph = scenario.topology.build(&config.reverse_edge_suffix)?;
        let mut interlocking = RouteTableInterlocking::new();
        interlocking.add_provider(Box::new(LoggingProvider));

        let mut controller = RouteController::new(graph, interlocking, config);
        let summary = Rc::new(RefCell::new(Summary::default()));
        let counts = Rc::clone(&summary);
        controller.events.subscribe_all(move |event: &Event| {
            info!("event {event:?}");
            match event.kind() {
                EventKind::CreateFahrstrasse => counts.borrow_mut().fahrstrassen_set += 1,
                EventKind::RemoveFahrstrasse => counts.borrow_mut().fahrstrassen_freed += 1,
                _ => {}
            }
        });

        Ok(Self {
            controller,
            spawns: scenario.spawns,
            faults: scenario.faults,
            summary,
        })
    }

    /// Run until `ticks` have passed or every train has been spawned and has finished
    pub fn run(&mut self, ticks: u64) -> Result<Summary, RunnerError> {
        for tick in 1..=ticks {
            self.step(tick)?;
            self.summary.borrow_mut().ticks = tick;
            if self.spawns.is_empty() && self.controller.trains.is_empty() {
                info!("all trains finished after {tick} ticks");
                break;
            }
        }
        Ok(self.summary.borrow().clone())
    }

    pub fn step(&mut self, tick: u64) -> Result<(), RunnerError> {
        self.controller.next_tick(tick)?;

        let due: Vec<FaultSpec> = self.faults.iter().filter(|f| f.tick == tick).cloned().collect();
        for fault in due {
            let edge = self.controller.graph.edge_index(&fault.edge)?;
            if let Some(track) = self.controller.graph.track_of(edge) {
                self.controller.apply_fault(track, fault.fault)?;
            }
        }

        let mut waiting = Vec::new();
        for spawn in std::mem::take(&mut self.spawns) {
            if spawn.tick > tick || !self.try_spawn(&spawn)? {
                waiting.push(spawn);
            }
        }
        self.spawns = waiting;

        let trains: Vec<TrainId> = self.controller.trains.keys().copied().collect();
        for id in trains {
            self.move_train(id)?;
            if self.controller.trains.get(&id).is_some_and(Train::has_finished) {
                self.controller.remove_train(id)?;
                self.summary.borrow_mut().finished += 1;
            }
        }
        Ok(())
    }

    fn try_spawn(&mut self, spawn: &SpawnSpec) -> Result<bool, RunnerError> {
        let graph = &self.controller.graph;
        let start = graph.edge_index(&spawn.start)?;
        let timetable = spawn
            .timetable
            .iter()
            .map(|name| graph.platform(name).cloned())
            .collect::<Result<Vec<Platform>, _>>()?;
        let Some(target) = timetable.first().map(|platform| platform.edge) else {
            warn!("spawn on {} has an empty timetable, dropping it", spawn.start);
            return Ok(true);
        };

        let Some(route) = self.controller.set_spawn_fahrstrasse(start, target)? else {
            return Ok(false);
        };
        let id = TrainId::generate();
        self.controller
            .add_train(Train::new(id, timetable).with_route(route).on_edge(start));
        self.controller.on_train_enter_edge(id, start)?;
        self.summary.borrow_mut().spawned += 1;
        Ok(true)
    }

    fn move_train(&mut self, id: TrainId) -> Result<(), RoutingError> {
        let Some(current) = self.controller.trains.get(&id).and_then(|train| train.current_edge) else {
            return Ok(());
        };
        let Some(next) = self.next_edge(id, current) else {
            return Ok(());
        };
        self.controller.on_train_leave_edge(id, current)?;
        self.controller.on_train_enter_edge(id, next)
    }

    fn next_edge(&self, id: TrainId, current: EdgeIndex) -> Option<EdgeIndex> {
        let graph = &self.controller.graph;
        let owned: Vec<&[EdgeIndex]> = self
            .controller
            .active_fahrstrassen()
            .values()
            .filter(|f| f.train == Some(id))
            .map(|f| f.segments.as_slice())
            .collect();

        // Along the current route
        for segments in &owned {
            if let Some(position) = segments.iter().position(|&edge| edge == current) {
                if let Some(&next) = segments.get(position + 1) {
                    return Some(next);
                }
            }
        }

        // Onto the next route
        let successors = graph.successors(current);
        for segments in &owned {
            if let Some(&first) = segments.first() {
                if successors.contains(&first) {
                    return Some(first);
                }
            }
        }

        // On sight past the last signal
        let target = self.controller.trains.get(&id)?.next_platform()?.edge;
        let router = Router::new(graph);
        if !matches!(router.leg_towards(current, target), Err(RoutingError::NoSignalPair { .. })) {
            return None;
        }
        let next = *router.get_edge_route(current, target).ok()?.get(1)?;
        let free = graph
            .track_of(next)
            .and_then(|track| graph.track(track))
            .is_some_and(|track| track.head().is_none_or(|r| r.train == id));
        free.then_some(next)
    }
}
