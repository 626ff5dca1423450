#![allow(clippy::implicit_hasher)]
#![allow(unknown_lints)]

pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod events;
pub mod import;
pub mod infrastructure;
pub mod interlocking;
pub mod logging;
pub mod models;
pub mod router;

#[cfg(test)]
mod test_support;

pub use config::ControllerConfig;
pub use controller::{RouteController, TrackFault};
pub use error::{ConfigError, RoutingError, TopologyError};
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
