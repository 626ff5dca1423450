use crate::models::{TrackId, TrainId};
use thiserror::Error;

/// Problems in the topology data itself, raised while loading or initializing
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("duplicate node `{0}`")]
    DuplicateNode(String),
    #[error("duplicate track `{0}`")]
    DuplicateTrack(String),
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("unknown edge `{0}`")]
    UnknownEdge(String),
    #[error("unknown platform `{0}`")]
    UnknownPlatform(String),
    #[error("unknown track {0}")]
    UnknownTrack(TrackId),
    #[error("switch `{switch}` is not connected to `{neighbour}`")]
    DisconnectedSwitch { switch: String, neighbour: String },
    #[error("signal `{signal}` has no track from its approach node `{approach}`")]
    InvalidSignalApproach { signal: String, approach: String },
    #[error("failed to parse topology: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fatal routing failures
///
/// Contention is never an error; these mean the Router topology and the
/// interlocking topology disagree, or a caller referred to something that
/// does not exist.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("no path from `{from}` to `{to}`")]
    NoPath { from: String, to: String },
    #[error("path from `{from}` passes fewer than two signals facing the direction of travel")]
    NoSignalPair { from: String },
    #[error("interlocking has no route from signal `{start}` to signal `{end}`")]
    NoInterlockingRoute { start: String, end: String },
    #[error("unknown train {0}")]
    UnknownTrain(TrainId),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
