//! Fixture topologies shared by the unit tests.

use crate::config::ControllerConfig;
use crate::controller::RouteController;
use crate::events::Event;
use crate::import::TopologySpec;
use crate::interlocking::RouteTableInterlocking;
use crate::models::{RailwayGraph, Reservation, TrainId, Tracks};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn build(value: serde_json::Value) -> RailwayGraph {
    let spec: TopologySpec = serde_json::from_value(value).expect("fixture parses");
    spec.build("-re").expect("fixture builds")
}

/// Straight double-direction line
///
/// ```text
/// A -t1- S1 -t2- W1 -t3- B -t4- S2 -t5- W2 -t6- C -t7- S3 -t8- D
/// ```
///
/// `S*` face east, `W*` face west. Platforms: PB on t4, PC on t7, PD on t8,
/// PBw on t3-re.
pub(crate) fn line_graph() -> RailwayGraph {
    build(json!({
        "nodes": [
            {"type": "plain", "name": "A"},
            {"type": "signal", "name": "S1", "approach": "A"},
            {"type": "signal", "name": "W1", "approach": "B"},
            {"type": "plain", "name": "B"},
            {"type": "signal", "name": "S2", "approach": "B"},
            {"type": "signal", "name": "W2", "approach": "C"},
            {"type": "plain", "name": "C"},
            {"type": "signal", "name": "S3", "approach": "C"},
            {"type": "plain", "name": "D"}
        ],
        "tracks": [
            {"name": "t1", "from": "A", "to": "S1", "length": 100.0},
            {"name": "t2", "from": "S1", "to": "W1", "length": 50.0},
            {"name": "t3", "from": "W1", "to": "B", "length": 200.0},
            {"name": "t4", "from": "B", "to": "S2", "length": 150.0},
            {"name": "t5", "from": "S2", "to": "W2", "length": 50.0},
            {"name": "t6", "from": "W2", "to": "C", "length": 200.0},
            {"name": "t7", "from": "C", "to": "S3", "length": 150.0},
            {"name": "t8", "from": "S3", "to": "D", "length": 100.0}
        ],
        "platforms": [
            {"name": "PB", "edge": "t4"},
            {"name": "PC", "edge": "t7"},
            {"name": "PD", "edge": "t8"},
            {"name": "PBw", "edge": "t3-re"}
        ]
    }))
}

/// One facing switch splitting into two signalled legs
///
/// ```text
/// A -a- SA -h- W -l- L -ls- SL -le- EL
///              W -r- R -rs- SR -rx- ER
/// ```
pub(crate) fn junction_graph() -> RailwayGraph {
    build(json!({
        "nodes": [
            {"type": "plain", "name": "A"},
            {"type": "signal", "name": "SA", "approach": "A"},
            {"type": "switch", "name": "W", "head": "SA", "left": "L", "right": "R"},
            {"type": "plain", "name": "L"},
            {"type": "signal", "name": "SL", "approach": "L"},
            {"type": "plain", "name": "EL"},
            {"type": "plain", "name": "R"},
            {"type": "signal", "name": "SR", "approach": "R"},
            {"type": "plain", "name": "ER"}
        ],
        "tracks": [
            {"name": "a", "from": "A", "to": "SA", "length": 100.0},
            {"name": "h", "from": "SA", "to": "W", "length": 50.0},
            {"name": "l", "from": "W", "to": "L", "length": 80.0},
            {"name": "ls", "from": "L", "to": "SL", "length": 120.0},
            {"name": "le", "from": "SL", "to": "EL", "length": 100.0},
            {"name": "r", "from": "W", "to": "R", "length": 60.0},
            {"name": "rs", "from": "R", "to": "SR", "length": 120.0},
            {"name": "rx", "from": "SR", "to": "ER", "length": 100.0}
        ],
        "platforms": [
            {"name": "PL", "edge": "ls"},
            {"name": "PR", "edge": "rs"}
        ]
    }))
}

/// Passing loop between two signals; the M1 side is shorter
///
/// ```text
///                 W1 -m1- M1 -m1b- W2
/// A -a- SA -h- W1                      W2 -x- X -xs- SX -xe- E
///                 W1 -m2- M2 -m2b- W2
/// ```
pub(crate) fn loop_graph() -> RailwayGraph {
    build(json!({
        "nodes": [
            {"type": "plain", "name": "A"},
            {"type": "signal", "name": "SA", "approach": "A"},
            {"type": "switch", "name": "W1", "head": "SA", "left": "M1", "right": "M2"},
            {"type": "plain", "name": "M1"},
            {"type": "plain", "name": "M2"},
            {"type": "switch", "name": "W2", "head": "X", "left": "M1", "right": "M2"},
            {"type": "plain", "name": "X"},
            {"type": "signal", "name": "SX", "approach": "X"},
            {"type": "plain", "name": "E"}
        ],
        "tracks": [
            {"name": "a", "from": "A", "to": "SA", "length": 100.0},
            {"name": "h", "from": "SA", "to": "W1", "length": 50.0},
            {"name": "m1", "from": "W1", "to": "M1", "length": 100.0},
            {"name": "m1b", "from": "M1", "to": "W2", "length": 100.0},
            {"name": "m2", "from": "W1", "to": "M2", "length": 150.0},
            {"name": "m2b", "from": "M2", "to": "W2", "length": 150.0},
            {"name": "x", "from": "W2", "to": "X", "length": 50.0},
            {"name": "xs", "from": "X", "to": "SX", "length": 100.0},
            {"name": "xe", "from": "SX", "to": "E", "length": 100.0}
        ],
        "platforms": [
            {"name": "PX", "edge": "xs"}
        ]
    }))
}

/// Line splitting at a facing switch, every branch ending after its last signal
///
/// ```text
/// A -t1- S1 -t2- B -t3- S2 -t4- W -tl- L -tl2- S3 -tl3- D
///                                W -tr- R -tr2- S4 -tr3- E
/// ```
///
/// Platforms: PD on tl3, PR on tr2, PE on tr3.
pub(crate) fn fork_graph() -> RailwayGraph {
    build(json!({
        "nodes": [
            {"type": "plain", "name": "A"},
            {"type": "signal", "name": "S1", "approach": "A"},
            {"type": "plain", "name": "B"},
            {"type": "signal", "name": "S2", "approach": "B"},
            {"type": "switch", "name": "W", "head": "S2", "left": "L", "right": "R"},
            {"type": "plain", "name": "L"},
            {"type": "signal", "name": "S3", "approach": "L"},
            {"type": "plain", "name": "D"},
            {"type": "plain", "name": "R"},
            {"type": "signal", "name": "S4", "approach": "R"},
            {"type": "plain", "name": "E"}
        ],
        "tracks": [
            {"name": "t1", "from": "A", "to": "S1", "length": 100.0},
            {"name": "t2", "from": "S1", "to": "B", "length": 200.0},
            {"name": "t3", "from": "B", "to": "S2", "length": 100.0},
            {"name": "t4", "from": "S2", "to": "W", "length": 50.0},
            {"name": "tl", "from": "W", "to": "L", "length": 80.0},
            {"name": "tl2", "from": "L", "to": "S3", "length": 120.0},
            {"name": "tl3", "from": "S3", "to": "D", "length": 100.0},
            {"name": "tr", "from": "W", "to": "R", "length": 80.0},
            {"name": "tr2", "from": "R", "to": "S4", "length": 120.0},
            {"name": "tr3", "from": "S4", "to": "E", "length": 100.0}
        ],
        "platforms": [
            {"name": "PD", "edge": "tl3"},
            {"name": "PR", "edge": "tr2"},
            {"name": "PE", "edge": "tr3"}
        ]
    }))
}

pub(crate) fn controller_for(graph: RailwayGraph) -> RouteController {
    crate::logging::init_for_tests();
    RouteController::new(graph, RouteTableInterlocking::new(), ControllerConfig::default())
}

pub(crate) fn edge(graph: &RailwayGraph, name: &str) -> EdgeIndex {
    graph.edge_index(name).expect("fixture edge")
}

pub(crate) fn node_path(graph: &RailwayGraph, names: &[&str]) -> Vec<NodeIndex> {
    names.iter().map(|name| graph.node_index(name).expect("fixture node")).collect()
}

/// Trains queued on the track of edge `name`, head first
pub(crate) fn queue(controller: &RouteController, name: &str) -> Vec<TrainId> {
    let track = controller.graph.track_of(edge(&controller.graph, name)).expect("fixture track");
    controller
        .graph
        .track(track)
        .map(|t| t.reservations.iter().map(|r| r.train).collect())
        .unwrap_or_default()
}

/// Put a train's reservations on the named edges, as if it had reserved them
pub(crate) fn hold(controller: &mut RouteController, train: TrainId, names: &[&str]) {
    for name in names {
        let edge = edge(&controller.graph, name);
        let track = controller.graph.track_of(edge).expect("fixture track");
        controller.graph.enqueue(track, Reservation { train, edge });
        controller.trains.get_mut(&train).expect("train added").reserved_tracks.push(track);
    }
}

/// Collect every event the controller publishes
pub(crate) fn event_log(controller: &mut RouteController) -> Rc<RefCell<Vec<Event>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    controller.events.subscribe_all(move |event: &Event| sink.borrow_mut().push(event.clone()));
    log
}
