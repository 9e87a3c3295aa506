use std::collections::HashMap;

use crate::geo::Vec2;

pub type OsmId = i64;

pub type Tags = HashMap<String, String>;

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct Node {
    pub id: OsmId,
    /// Decimal degrees, as read from the input.
    pub lon: f64,
    pub lat: f64,
    /// World space position.
    pub pos: Vec2,
    pub tile: u32,
    pub tags: Tags,
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct Way {
    pub id: OsmId,
    /// Member node ids in input order.
    pub nodes: Vec<OsmId>,
    /// Tile of the first member node that was stored.
    pub tile: u32,
    pub tags: Tags,
}
