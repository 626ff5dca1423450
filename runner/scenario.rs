use crate::error::RunnerError;
use route_control::import::TopologySpec;
use route_control::TrackFault;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A train the spawner tries to create from `tick` on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpawnSpec {
    pub tick: u64,
    /// Edge the train appears on
    pub start: String,
    /// Platform names in visiting order
    pub timetable: Vec<String>,
}

/// A fault injected at `tick`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaultSpec {
    pub tick: u64,
    /// Any edge of the affected track
    pub edge: String,
    /// `{"blocked": true}` or `{"speed_limit": 8.3}`
    pub fault: TrackFault,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub topology: TopologySpec,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default)]
    pub spawns: Vec<SpawnSpec>,
    #[serde(default)]
    pub faults: Vec<FaultSpec>,
}

fn default_ticks() -> u64 {
    100
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, RunnerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, RunnerError> {
        let json = std::fs::read_to_string(path).map_err(|source| RunnerError::ReadScenario {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario_with_fault() {
        let json = r#"{
            "topology": {"nodes": [], "tracks": []},
            "spawns": [{"tick": 1, "start": "t1", "timetable": ["PB"]}],
            "faults": [{"tick": 5, "edge": "t3", "fault": {"blocked": true}}]
        }"#;

        let scenario = Scenario::from_json(json).expect("parses");
        assert_eq!(scenario.ticks, 100);
        assert_eq!(scenario.spawns[0].timetable, vec!["PB".to_string()]);
        assert_eq!(scenario.faults[0].fault, TrackFault::Blocked(true));
    }
}
