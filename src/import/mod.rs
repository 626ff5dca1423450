pub mod topology;

pub use topology::{NodeSpec, PlatformSpec, TopologySpec, TrackSpec};
