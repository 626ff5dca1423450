use super::id::{TrackId, TrainId};
use petgraph::stable_graph::EdgeIndex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackDirection {
    Forward,  // From the track's first node to its second
    Backward, // Against the definition order
}

/// One travel direction of a track
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub name: String,
    pub track: TrackId,
    pub direction: TrackDirection,
    pub length: f64,
    pub max_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub train: TrainId,
    pub edge: EdgeIndex,
}

/// Physical track between two nodes, the unit of reservation
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub forward: EdgeIndex,
    pub backward: EdgeIndex,
    pub length: f64,
    pub max_speed: f64,
    pub blocked: bool,
    /// FIFO; the head is the train allowed to occupy or pass the track
    pub reservations: VecDeque<Reservation>,
}

impl Track {
    #[must_use]
    pub fn opposite(&self, edge: EdgeIndex) -> Option<EdgeIndex> {
        if edge == self.forward {
            Some(self.backward)
        } else if edge == self.backward {
            Some(self.forward)
        } else {
            None
        }
    }

    #[must_use]
    pub fn head(&self) -> Option<&Reservation> {
        self.reservations.front()
    }

    #[must_use]
    pub fn last_reservation(&self) -> Option<&Reservation> {
        self.reservations.back()
    }

    #[must_use]
    pub fn is_reserved(&self) -> bool {
        !self.reservations.is_empty()
    }

    #[must_use]
    pub fn is_reserved_by(&self, train: TrainId) -> bool {
        self.reservations.iter().any(|r| r.train == train)
    }

    #[must_use]
    pub fn is_head(&self, train: TrainId) -> bool {
        self.head().is_some_and(|r| r.train == train)
    }

    /// Whether another train holds this track travelling against `edge`
    #[must_use]
    pub fn is_reserved_against(&self, edge: EdgeIndex, train: TrainId) -> bool {
        self.reservations
            .iter()
            .any(|r| r.train != train && r.edge != edge)
    }

    pub fn remove_reservation(&mut self, train: TrainId) -> Option<Reservation> {
        let position = self.reservations.iter().position(|r| r.train == train)?;
        self.reservations.remove(position)
    }
}
