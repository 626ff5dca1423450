use super::id::{RouteId, TrackId, TrainId};
use super::station::Platform;
use petgraph::stable_graph::EdgeIndex;

#[derive(Debug, Clone)]
pub struct Train {
    pub id: TrainId,
    /// Target platforms in visiting order
    pub timetable: Vec<Platform>,
    /// Index of the next platform to reach
    pub station_index: usize,
    /// Route the physical bridge currently follows
    pub route_id: Option<RouteId>,
    /// Tracks reserved for this train, in travel order
    pub reserved_tracks: Vec<TrackId>,
    pub current_edge: Option<EdgeIndex>,
}

impl Train {
    #[must_use]
    pub fn new(id: TrainId, timetable: Vec<Platform>) -> Self {
        Self {
            id,
            timetable,
            station_index: 0,
            route_id: None,
            reserved_tracks: Vec::new(),
            current_edge: None,
        }
    }

    #[must_use]
    pub fn with_route(mut self, route_id: RouteId) -> Self {
        self.route_id = Some(route_id);
        self
    }

    #[must_use]
    pub fn on_edge(mut self, edge: EdgeIndex) -> Self {
        self.current_edge = Some(edge);
        self
    }

    #[must_use]
    pub fn has_finished(&self) -> bool {
        self.station_index >= self.timetable.len()
    }

    #[must_use]
    pub fn next_platform(&self) -> Option<&Platform> {
        self.timetable.get(self.station_index)
    }

    /// Advance the timetable when `edge` is the edge of the next platform
    ///
    /// Returns whether the train arrived at a platform.
    pub fn arrive(&mut self, edge: EdgeIndex) -> bool {
        if self.next_platform().is_some_and(|p| p.edge == edge) {
            self.station_index += 1;
            true
        } else {
            false
        }
    }

    /// Last track of the reservation chain
    #[must_use]
    pub fn chain_end(&self) -> Option<TrackId> {
        self.reserved_tracks.last().copied()
    }

    pub fn release_track(&mut self, track: TrackId) -> bool {
        let before = self.reserved_tracks.len();
        self.reserved_tracks.retain(|&t| t != track);
        before != self.reserved_tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_with_stops() -> Train {
        Train::new(
            TrainId(1),
            vec![
                Platform::new("A1", EdgeIndex::new(2)),
                Platform::new("B1", EdgeIndex::new(5)),
            ],
        )
    }

    #[test]
    fn test_arrive_advances_only_at_next_platform() {
        let mut train = train_with_stops();

        assert!(!train.arrive(EdgeIndex::new(5)));
        assert_eq!(train.station_index, 0);

        assert!(train.arrive(EdgeIndex::new(2)));
        assert_eq!(train.next_platform().map(|p| p.name.as_str()), Some("B1"));

        assert!(train.arrive(EdgeIndex::new(5)));
        assert!(train.has_finished());
        assert!(train.next_platform().is_none());
    }

    #[test]
    fn test_release_track() {
        let mut train = train_with_stops();
        train.reserved_tracks = vec![TrackId(0), TrackId(1)];

        assert!(train.release_track(TrackId(0)));
        assert!(!train.release_track(TrackId(0)));
        assert_eq!(train.chain_end(), Some(TrackId(1)));
    }
}
