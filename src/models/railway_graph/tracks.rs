use super::RailwayGraph;
use crate::models::id::{TrackId, TrainId};
use crate::models::track::{Reservation, Track};
use petgraph::stable_graph::EdgeIndex;

/// Extension trait for track and reservation-queue access on `RailwayGraph`
pub trait Tracks {
    fn track(&self, id: TrackId) -> Option<&Track>;

    fn track_mut(&mut self, id: TrackId) -> Option<&mut Track>;

    /// Track an edge belongs to
    fn track_of(&self, edge: EdgeIndex) -> Option<TrackId>;

    /// Tracks of an edge sequence, in the same order
    fn tracks_of(&self, edges: &[EdgeIndex]) -> Option<Vec<TrackId>>;

    /// Append a reservation at the tail of a track's queue
    fn enqueue(&mut self, id: TrackId, reservation: Reservation);

    /// Drop a train's entry from a track's queue, wherever it is
    fn release(&mut self, id: TrackId, train: TrainId) -> bool;
}

impl Tracks for RailwayGraph {
    fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(id.index())
    }

    fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(id.index())
    }

    fn track_of(&self, edge: EdgeIndex) -> Option<TrackId> {
        self.graph.edge_weight(edge).map(|e| e.track)
    }

    fn tracks_of(&self, edges: &[EdgeIndex]) -> Option<Vec<TrackId>> {
        edges.iter().map(|&edge| self.track_of(edge)).collect()
    }

    fn enqueue(&mut self, id: TrackId, reservation: Reservation) {
        if let Some(track) = self.track_mut(id) {
            track.reservations.push_back(reservation);
        }
    }

    fn release(&mut self, id: TrackId, train: TrainId) -> bool {
        self.track_mut(id)
            .and_then(|track| track.remove_reservation(train))
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::line_graph;

    #[test]
    fn test_track_of_both_directions() {
        let graph = line_graph();
        let forward = graph.edge_index("t3").expect("edge");
        let backward = graph.edge_index("t3-re").expect("edge");

        assert_eq!(graph.track_of(forward), graph.track_of(backward));
        assert!(graph.track_of(forward).is_some());
    }

    #[test]
    fn test_enqueue_and_release() {
        let mut graph = line_graph();
        let edge = graph.edge_index("t2").expect("edge");
        let id = graph.track_of(edge).expect("track");

        graph.enqueue(id, Reservation { train: TrainId(1), edge });
        graph.enqueue(id, Reservation { train: TrainId(2), edge });
        assert!(graph.track(id).is_some_and(|t| t.is_head(TrainId(1))));

        assert!(graph.release(id, TrainId(1)));
        assert!(!graph.release(id, TrainId(1)));
        assert!(graph.track(id).is_some_and(|t| t.is_head(TrainId(2))));
    }
}
