use super::RouteController;
use crate::interlocking::Interlocking;
use crate::models::{Nodes, Reservation, TrackId, TrainId, Tracks};
use crate::router::{Leg, Router};
use log::{debug, warn};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use std::collections::HashSet;

/// State of one top-level `reserve_route` call
///
/// Every queue entry added on the way is journaled so a failure anywhere,
/// including deep inside a chain extension, can be undone completely.
#[derive(Default)]
struct Transaction {
    journal: Vec<(TrainId, TrackId)>,
    planned: Vec<(TrainId, EdgeIndex, Leg)>,
    visited: HashSet<TrainId>,
}

impl<I: Interlocking> RouteController<I> {
    /// Reserve every track of a node route for `train`
    ///
    /// Fails without touching any queue when a track is blocked, when a track
    /// is held by another train in the opposite direction, or when a leading
    /// train whose reservation chain ends on the route cannot be extended.
    /// Tracks the train already holds are skipped.
    pub fn reserve_route(&mut self, route: &[NodeIndex], train: TrainId) -> bool {
        let Some(edges) = self.graph.path_edges(route) else {
            warn!("reserve_route for train {train}: route is not connected");
            return false;
        };
        let Some(tracks) = self.graph.tracks_of(&edges) else {
            return false;
        };

        let mut transaction = Transaction::default();
        transaction.visited.insert(train);

        if self.reserve_tracks(train, &edges, &tracks, &mut transaction) {
            for (holder, from_edge, leg) in transaction.planned {
                self.planned_legs.insert(holder, (from_edge, leg));
            }
            true
        } else {
            self.rollback(transaction.journal);
            false
        }
    }

    fn reserve_tracks(
        &mut self,
        train: TrainId,
        edges: &[EdgeIndex],
        tracks: &[TrackId],
        transaction: &mut Transaction,
    ) -> bool {
        // Opposing traffic and faults
        for (&edge, &id) in edges.iter().zip(tracks) {
            let Some(track) = self.graph.track(id) else {
                return false;
            };
            if track.blocked {
                debug!("train {train}: {} is blocked", track.name);
                return false;
            }
            if track.is_reserved_against(edge, train) {
                debug!("train {train}: {} is reserved in the opposite direction", track.name);
                return false;
            }
        }

        // Extend leading trains whose chain stops on this route
        for &id in tracks {
            let Some(holder) = self.graph.track(id).and_then(|t| t.last_reservation()).map(|r| r.train) else {
                continue;
            };
            if transaction.visited.contains(&holder) {
                continue;
            }
            let Some(leader) = self.trains.get(&holder) else {
                continue;
            };
            if leader.chain_end() != Some(id) || leader.has_finished() {
                continue;
            }

            transaction.visited.insert(holder);
            if !self.extend_chain(holder, id, transaction) {
                debug!("train {train}: could not extend the chain of train {holder}");
                return false;
            }
        }

        for (&edge, &id) in edges.iter().zip(tracks) {
            if self.commit_reservation(train, edge, id) {
                transaction.journal.push((train, id));
            }
        }
        true
    }

    /// Reserve the next leg of a train whose reservation chain ends on `chain_end`
    fn extend_chain(&mut self, holder: TrainId, chain_end: TrackId, transaction: &mut Transaction) -> bool {
        let Some(from_edge) = self
            .graph
            .track(chain_end)
            .and_then(|track| track.reservations.iter().find(|r| r.train == holder))
            .map(|r| r.edge)
        else {
            return false;
        };
        let Some(train) = self.trains.get(&holder) else {
            return false;
        };
        let Some(target) = train
            .timetable
            .iter()
            .skip(train.station_index)
            .find(|platform| {
                platform.edge != from_edge
                    && self
                        .graph
                        .track_of(platform.edge)
                        .is_some_and(|t| !train.reserved_tracks.contains(&t))
            })
            .map(|platform| platform.edge)
        else {
            return false;
        };

        let leg = match Router::new(&self.graph).leg_towards(from_edge, target) {
            Ok(leg) => leg,
            Err(e) => {
                warn!("cannot extend reservation of train {holder}: {e}");
                return false;
            }
        };

        debug!(
            "extending train {holder} from {} over {} tracks",
            self.graph.edge_name(from_edge),
            leg.tracks.len()
        );
        if !self.reserve_tracks(holder, &leg.edges, &leg.tracks, transaction) {
            return false;
        }
        transaction.planned.push((holder, from_edge, leg));
        true
    }

    /// Append `train` to a track's queue and to its chain, unless it already holds the track
    pub(super) fn commit_reservation(&mut self, train: TrainId, edge: EdgeIndex, track: TrackId) -> bool {
        if self.graph.track(track).is_none_or(|t| t.is_reserved_by(train)) {
            return false;
        }
        self.graph.enqueue(track, Reservation { train, edge });
        if let Some(holder) = self.trains.get_mut(&train) {
            holder.reserved_tracks.push(track);
        }
        true
    }

    fn rollback(&mut self, journal: Vec<(TrainId, TrackId)>) {
        for (train, track) in journal.into_iter().rev() {
            self.graph.release(track, train);
            if let Some(holder) = self.trains.get_mut(&train) {
                holder.release_track(track);
            }
        }
    }
}
