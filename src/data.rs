use std::collections::HashMap;

use self::osm::{Node, OsmId, Way};

pub mod osm;

/// Every node and way stored during an import, keyed by id. Records outside
/// the imported region are never stored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct World {
    pub nodes: HashMap<OsmId, Node>,
    pub ways: HashMap<OsmId, Way>,
}

impl World {
    pub fn node(&self, id: OsmId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn way(&self, id: OsmId) -> Option<&Way> {
        self.ways.get(&id)
    }
}
