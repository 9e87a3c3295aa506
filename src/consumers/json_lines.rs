use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use super::{TagFilter, TileConsumer};
use crate::data::osm::{Node, OsmId, Tags, Way};
use crate::errors::{Error, Result};
use crate::geo::Vec2;
use crate::tiles::TileBuffer;

const CONSUMER_NAME: &str = "json_lines";

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonRecord<'a> {
    Node {
        id: OsmId,
        lon: f64,
        lat: f64,
        pos: Vec2,
        tags: BTreeMap<&'a str, &'a str>,
    },
    Way {
        id: OsmId,
        nodes: &'a [OsmId],
        tags: BTreeMap<&'a str, &'a str>,
    },
}

/// Writes one JSON object per record, newline terminated.
#[derive(Debug, Default)]
pub struct JsonLinesConsumer {
    filter: TagFilter,
}

impl JsonLinesConsumer {
    pub fn new(filter: TagFilter) -> Self {
        JsonLinesConsumer { filter }
    }

    fn sorted_tags<'a>(&self, tags: &'a Tags) -> BTreeMap<&'a str, &'a str> {
        tags.iter()
            .filter(|(key, _)| self.filter.keeps(key))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    fn write_line(buffer: &mut TileBuffer, record: &JsonRecord) -> Result<()> {
        serde_json::to_writer(&mut *buffer, record).map_err(|err| Error::Encoding {
            consumer: CONSUMER_NAME,
            message: err.to_string(),
        })?;
        buffer.write_all(b"\n")?;
        Ok(())
    }
}

impl TileConsumer for JsonLinesConsumer {
    fn name(&self) -> &'static str {
        CONSUMER_NAME
    }

    fn import_node(&mut self, node: &Node, buffer: &mut TileBuffer) -> Result<()> {
        let record = JsonRecord::Node {
            id: node.id,
            lon: node.lon,
            lat: node.lat,
            pos: node.pos,
            tags: self.sorted_tags(&node.tags),
        };
        Self::write_line(buffer, &record)
    }

    fn import_way(&mut self, way: &Way, buffer: &mut TileBuffer) -> Result<()> {
        let record = JsonRecord::Way {
            id: way.id,
            nodes: &way.nodes,
            tags: self.sorted_tags(&way.tags),
        };
        Self::write_line(buffer, &record)
    }
}
