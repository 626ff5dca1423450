mod error;
mod scenario;
mod sim;

use error::RunnerError;
use log::info;
use route_control::{logging, ControllerConfig};
use scenario::Scenario;
use sim::Simulation;
use std::path::PathBuf;

fn main() -> Result<(), RunnerError> {
    let config = ControllerConfig::from_env()?;
    logging::init(&config.log_filter);

    let path = std::env::args().nth(1).map(PathBuf::from).ok_or(RunnerError::Usage)?;
    let scenario = Scenario::from_file(&path)?;
    let ticks = std::env::var("TICKS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(scenario.ticks);

    info!("running {} for up to {ticks} ticks", path.display());
    let summary = Simulation::new(scenario, config)?.run(ticks)?;
    info!(
        "{} ticks, {} trains spawned, {} finished, {} routes set, {} routes freed",
        summary.ticks, summary.spawned, summary.finished, summary.fahrstrassen_set, summary.fahrstrassen_freed
    );
    Ok(())
}
