use petgraph::stable_graph::EdgeIndex;

/// Stopping place of a station, located on one directed edge
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub name: String,
    pub edge: EdgeIndex,
}

impl Platform {
    #[must_use]
    pub fn new(name: impl Into<String>, edge: EdgeIndex) -> Self {
        Self { name: name.into(), edge }
    }
}
