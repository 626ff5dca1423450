use route_control::{ConfigError, RoutingError, TopologyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("usage: route-control-runner <scenario.json>")]
    Usage,
    #[error("failed to read scenario `{path}`: {source}")]
    ReadScenario {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    ParseScenario(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
}
