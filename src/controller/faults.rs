use super::{ReservationAttempt, RouteController};
use crate::error::{RoutingError, TopologyError};
use crate::interlocking::Interlocking;
use crate::models::{Nodes, TrackId, TrainId, Tracks};
use crate::router::Router;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackFault {
    Blocked(bool),
    /// New speed limit in m/s
    SpeedLimit(f64),
}

impl<I: Interlocking> RouteController<I> {
    /// Apply a fault to a track
    ///
    /// Blocking a track reroutes every train that reserved it for a leg not yet
    /// set. Speed limits and unblocking leave reservations untouched.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTrack`, or `NoInterlockingRoute` if a recomputed leg has no
    /// interlocking route
    pub fn apply_fault(&mut self, id: TrackId, fault: TrackFault) -> Result<(), RoutingError> {
        let Some(track) = self.graph.track_mut(id) else {
            return Err(TopologyError::UnknownTrack(id).into());
        };
        match fault {
            TrackFault::Blocked(blocked) => track.blocked = blocked,
            TrackFault::SpeedLimit(limit) => track.max_speed = limit,
        }
        let (forward, backward) = (track.forward, track.backward);
        info!("{} now {fault:?}", track.name);

        if let TrackFault::SpeedLimit(limit) = fault {
            for edge in [forward, backward] {
                if let Some(weight) = self.graph.graph.edge_weight_mut(edge) {
                    weight.max_speed = limit;
                }
            }
        }

        if fault != TrackFault::Blocked(true) {
            return Ok(());
        }

        let affected: Vec<TrainId> = self
            .trains
            .values()
            .filter(|train| train.reserved_tracks.contains(&id))
            .map(|train| train.id)
            .filter(|&train| !self.is_track_route_set(train, id))
            .collect();
        for train in affected {
            self.reroute(train)?;
        }
        Ok(())
    }

    fn is_track_route_set(&self, train: TrainId, track: TrackId) -> bool {
        self.active_fahrstrassen
            .values()
            .any(|f| f.train == Some(train) && f.tracks.contains(&track))
    }

    /// Drop a train's unset leg and request it again from where it was requested
    ///
    /// The leading tracks the old and the new leg share stay reserved, so the
    /// train keeps its place in their queues.
    fn reroute(&mut self, train: TrainId) -> Result<(), RoutingError> {
        let mut dropped: Vec<ReservationAttempt> = Vec::new();
        for queue in [&mut self.routes_to_be_set, &mut self.routes_to_be_reserved] {
            let (mine, others): (Vec<_>, Vec<_>) =
                std::mem::take(queue).into_iter().partition(|attempt| attempt.train == train);
            *queue = others;
            for attempt in mine {
                if !dropped.iter().any(|d: &ReservationAttempt| d.is_for(attempt.train, &attempt.interlocking_route)) {
                    dropped.push(attempt);
                }
            }
        }
        let planned = self.planned_legs.remove(&train).map(|(from_edge, _)| from_edge);

        let Some(from_edge) = dropped.first().map(|a| a.from_edge).or(planned) else {
            return Ok(());
        };

        let Some(current) = self.trains.get(&train) else {
            return Ok(());
        };
        let detour = current
            .next_platform()
            .and_then(|platform| Router::new(&self.graph).leg_towards(from_edge, platform.edge).ok())
            .map(|leg| leg.tracks)
            .unwrap_or_default();
        let unset: Vec<TrackId> = current
            .reserved_tracks
            .iter()
            .copied()
            .filter(|&track| !self.is_track_route_set(train, track))
            .collect();
        let kept = unset.iter().zip(&detour).take_while(|(old, new)| old == new).count();
        for &track in &unset[kept..] {
            self.graph.release(track, train);
            if let Some(current) = self.trains.get_mut(&train) {
                current.release_track(track);
            }
        }

        info!("rerouting train {train} from {}", self.graph.edge_name(from_edge));
        match self.set_fahrstrasse(train, from_edge) {
            Ok(()) => Ok(()),
            Err(RoutingError::NoPath { from, to }) => {
                warn!("train {train} has no way from {from} to {to}, waiting for the fault to clear");
                self.routes_to_be_reserved.extend(dropped);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
