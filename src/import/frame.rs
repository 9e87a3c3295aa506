use std::str::FromStr;

use crate::data::osm::{Node, OsmId, Tags, Way};
use crate::errors::{Error, Result};
use crate::geo::Vec2;
use crate::source::ElementStart;

/// One open element on the parse stack.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Frame {
    Bounds,
    Node(NodeBuilder),
    Way(WayBuilder),
    /// `<nd>`: already appended to the parent way.
    MemberRef,
    /// `<tag>`: already applied to the parent.
    Tag,
    /// `<relation>`, `<area>` or `<member>`: may carry tags, which are dropped.
    Relation,
    /// Elements that produce no record and carry no tags: the document root
    /// and anything unknown.
    Ignored,
}

impl Frame {
    pub(crate) fn describe(frame: Option<&Frame>) -> &'static str {
        match frame {
            None => "the document root",
            Some(Frame::Bounds) => "<bounds>",
            Some(Frame::Node(_)) => "<node>",
            Some(Frame::Way(_)) => "<way>",
            Some(Frame::MemberRef) => "<nd>",
            Some(Frame::Tag) => "<tag>",
            Some(Frame::Relation) => "a relation",
            Some(Frame::Ignored) => "an ignored element",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NodeBuilder {
    pub(crate) id: OsmId,
    pub(crate) lon: f64,
    pub(crate) lat: f64,
    pub(crate) pos: Vec2,
    pub(crate) tags: Tags,
}

impl NodeBuilder {
    pub(crate) fn finish(self, tile: u32) -> Node {
        Node {
            id: self.id,
            lon: self.lon,
            lat: self.lat,
            pos: self.pos,
            tile,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WayBuilder {
    pub(crate) id: OsmId,
    pub(crate) nodes: Vec<OsmId>,
    pub(crate) tags: Tags,
}

impl WayBuilder {
    pub(crate) fn new(id: OsmId) -> Self {
        WayBuilder {
            id,
            nodes: Vec::new(),
            tags: Tags::new(),
        }
    }

    pub(crate) fn finish(self, tile: u32) -> Way {
        Way {
            id: self.id,
            nodes: self.nodes,
            tile,
            tags: self.tags,
        }
    }
}

pub(crate) fn required_attribute<'a>(
    start: &'a ElementStart,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str> {
    start
        .attribute(attribute)
        .ok_or(Error::MissingAttribute { element, attribute })
}

pub(crate) fn parse_attribute<T: FromStr>(
    start: &ElementStart,
    element: &'static str,
    attribute: &'static str,
) -> Result<T> {
    let value = required_attribute(start, element, attribute)?;
    value.trim().parse().map_err(|_| Error::InvalidNumber {
        element,
        attribute,
        value: value.to_owned(),
    })
}
