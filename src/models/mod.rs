mod id;
mod node;
mod railway_graph;
mod station;
mod track;
mod train;

pub use id::{RouteId, TrackId, TrainId};
pub use node::{Node, NodeKind, SignalState, SwitchState};
pub use railway_graph::{Nodes, RailwayGraph, Signals, Tracks};
pub use station::Platform;
pub use track::{Edge, Reservation, Track, TrackDirection};
pub use train::Train;
