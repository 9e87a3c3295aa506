use std::collections::BTreeMap;

use log::info;

use super::TileConsumer;
use crate::data::osm::{Node, Way};
use crate::errors::Result;
use crate::tiles::TileBuffer;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TileCounts {
    pub nodes: u64,
    pub ways: u64,
}

/// Counts records per tile and logs a summary at the end of the import.
/// Writes nothing to the tile buffers.
#[derive(Debug, Default)]
pub struct StatsConsumer {
    counts: BTreeMap<u32, TileCounts>,
    finished: bool,
}

impl StatsConsumer {
    pub fn counts(&self) -> &BTreeMap<u32, TileCounts> {
        &self.counts
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl TileConsumer for StatsConsumer {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn import_node(&mut self, node: &Node, _buffer: &mut TileBuffer) -> Result<()> {
        self.counts.entry(node.tile).or_default().nodes += 1;
        Ok(())
    }

    fn import_way(&mut self, way: &Way, _buffer: &mut TileBuffer) -> Result<()> {
        self.counts.entry(way.tile).or_default().ways += 1;
        Ok(())
    }

    fn import_finished(&mut self) -> Result<()> {
        self.finished = true;
        for (tile, counts) in &self.counts {
            info!(tile = *tile, nodes = counts.nodes, ways = counts.ways; "Tile contents");
        }
        let busiest = self
            .counts
            .iter()
            .max_by_key(|(_, counts)| counts.nodes + counts.ways)
            .map(|(tile, _)| *tile);
        if let Some(busiest) = busiest {
            info!(tiles = self.counts.len(), busiest_tile = busiest; "Import statistics");
        }
        Ok(())
    }
}
