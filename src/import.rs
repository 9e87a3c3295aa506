//! Single-pass import of an element stream into per-tile consumer buffers.
//!
//! Open elements live on an explicit stack. A record is completed, routed
//! and stored exactly when its frame is popped.

mod frame;

use log::{debug, info, trace, warn};

use self::frame::{parse_attribute, required_attribute, Frame, NodeBuilder, WayBuilder};
use crate::consumers::TileConsumer;
use crate::data::osm::{OsmId, Tags};
use crate::data::World;
use crate::errors::{Error, Result};
use crate::geo::{GeoCoords, GeoError, GeoMap};
use crate::source::{ElementEvent, ElementSource, ElementStart};
use crate::tiles::TileBuffers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    /// No `<bounds>` seen yet; records cannot be placed.
    Idle,
    /// Projection and tile buffers exist.
    Ready,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub nodes_stored: u64,
    pub ways_stored: u64,
    pub nodes_discarded: u64,
    pub ways_discarded: u64,
}

/// Everything a finished run produced.
pub struct ImportOutput {
    pub world: World,
    pub geo_map: GeoMap,
    pub tiles: TileBuffers,
    pub stats: ImportStats,
    /// The consumers, handed back in registration order.
    pub consumers: Vec<Box<dyn TileConsumer>>,
}

struct Region {
    geo_map: GeoMap,
    tiles: TileBuffers,
}

enum ImportState {
    Idle,
    Ready(Region),
}

/// State of one import. Built per input, fed events in order, then finished.
pub struct ImportRun {
    grid_size: u32,
    consumers: Vec<Box<dyn TileConsumer>>,
    state: ImportState,
    stack: Vec<Frame>,
    world: World,
    stats: ImportStats,
}

impl ImportRun {
    pub fn new(grid_size: u32, consumers: Vec<Box<dyn TileConsumer>>) -> Result<Self> {
        if grid_size % 2 == 0 {
            return Err(GeoError::EvenGridDimension(grid_size).into());
        }
        Ok(ImportRun {
            grid_size,
            consumers,
            state: ImportState::Idle,
            stack: Vec::new(),
            world: World::default(),
            stats: ImportStats::default(),
        })
    }

    pub fn phase(&self) -> ImportPhase {
        match self.state {
            ImportState::Idle => ImportPhase::Idle,
            ImportState::Ready(_) => ImportPhase::Ready,
        }
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn stats(&self) -> ImportStats {
        self.stats
    }

    /// Pulls every event from `source`, then finishes the run.
    pub fn run<S: ElementSource>(mut self, source: &mut S) -> Result<ImportOutput> {
        while let Some(event) = source.next_event()? {
            self.feed(event)?;
        }
        self.finish()
    }

    pub fn feed(&mut self, event: ElementEvent) -> Result<()> {
        match event {
            ElementEvent::Start(start) => {
                self.open_element(&start)?;
                if start.is_self_closing() {
                    self.close_element()?;
                }
                Ok(())
            }
            ElementEvent::End => self.close_element(),
        }
    }

    /// Notifies every consumer that the input is exhausted and hands back
    /// the results.
    pub fn finish(self) -> Result<ImportOutput> {
        let ImportRun {
            mut consumers,
            state,
            stack,
            world,
            stats,
            ..
        } = self;

        if !stack.is_empty() {
            return Err(Error::UnterminatedElements { open: stack.len() });
        }
        let ImportState::Ready(Region { geo_map, tiles }) = state else {
            return Err(Error::MissingBounds);
        };

        for consumer in consumers.iter_mut() {
            consumer.import_finished()?;
        }
        info!(
            nodes = stats.nodes_stored,
            ways = stats.ways_stored,
            discarded_nodes = stats.nodes_discarded,
            discarded_ways = stats.ways_discarded;
            "Imported records"
        );

        Ok(ImportOutput {
            world,
            geo_map,
            tiles,
            stats,
            consumers,
        })
    }

    fn open_element(&mut self, start: &ElementStart) -> Result<()> {
        let frame = match start.name() {
            "bounds" => self.open_bounds(start)?,
            "node" => self.open_node(start)?,
            "way" => self.open_way(start)?,
            "nd" => self.open_member_ref(start)?,
            "tag" => self.open_tag(start)?,
            "relation" | "area" | "member" => Frame::Relation,
            other => {
                trace!(element = other; "Ignoring element");
                Frame::Ignored
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    fn close_element(&mut self) -> Result<()> {
        match self.stack.pop().ok_or(Error::UnexpectedEnd)? {
            Frame::Node(node) => self.complete_node(node),
            Frame::Way(way) => self.complete_way(way),
            Frame::Bounds | Frame::MemberRef | Frame::Tag | Frame::Relation | Frame::Ignored => {
                Ok(())
            }
        }
    }

    fn open_bounds(&mut self, start: &ElementStart) -> Result<Frame> {
        if let ImportState::Ready(_) = self.state {
            return Err(Error::DuplicateBounds);
        }
        let min_bounds = GeoCoords::from_degrees(
            parse_attribute(start, "bounds", "minlon")?,
            parse_attribute(start, "bounds", "minlat")?,
        )?;
        let max_bounds = GeoCoords::from_degrees(
            parse_attribute(start, "bounds", "maxlon")?,
            parse_attribute(start, "bounds", "maxlat")?,
        )?;
        let geo_map = GeoMap::with_grid_size(min_bounds, max_bounds, self.grid_size)?;
        let tiles = TileBuffers::new(geo_map.tile_count(), self.consumers.len());

        let negative = geo_map.geo_to_world(min_bounds);
        let positive = geo_map.geo_to_world(max_bounds);
        debug!(
            min_x = negative.x,
            min_y = negative.y,
            max_x = positive.x,
            max_y = positive.y,
            tiles = geo_map.tile_count();
            "Projected bounds"
        );

        self.state = ImportState::Ready(Region { geo_map, tiles });
        Ok(Frame::Bounds)
    }

    fn open_node(&mut self, start: &ElementStart) -> Result<Frame> {
        let ImportState::Ready(region) = &self.state else {
            return Err(Error::BeforeBounds { element: "node" });
        };
        let id: OsmId = parse_attribute(start, "node", "id")?;
        let lon: f64 = parse_attribute(start, "node", "lon")?;
        let lat: f64 = parse_attribute(start, "node", "lat")?;
        let pos = region.geo_map.geo_to_world(GeoCoords::from_degrees(lon, lat)?);

        Ok(Frame::Node(NodeBuilder {
            id,
            lon,
            lat,
            pos,
            tags: Tags::new(),
        }))
    }

    fn open_way(&mut self, start: &ElementStart) -> Result<Frame> {
        if let ImportState::Idle = self.state {
            return Err(Error::BeforeBounds { element: "way" });
        }
        let id = parse_attribute(start, "way", "id")?;
        Ok(Frame::Way(WayBuilder::new(id)))
    }

    fn open_member_ref(&mut self, start: &ElementStart) -> Result<Frame> {
        let node_ref: OsmId = parse_attribute(start, "nd", "ref")?;
        let parent = Frame::describe(self.stack.last());
        match self.stack.last_mut() {
            Some(Frame::Way(way)) => {
                way.nodes.push(node_ref);
                Ok(Frame::MemberRef)
            }
            _ => Err(misplaced("nd", parent)),
        }
    }

    fn open_tag(&mut self, start: &ElementStart) -> Result<Frame> {
        let key = required_attribute(start, "tag", "k")?;
        let value = required_attribute(start, "tag", "v")?;
        let parent = Frame::describe(self.stack.last());
        match self.stack.last_mut() {
            Some(Frame::Node(node)) => {
                node.tags.insert(key.to_owned(), value.to_owned());
            }
            Some(Frame::Way(way)) => {
                way.tags.insert(key.to_owned(), value.to_owned());
            }
            Some(Frame::Relation) => {}
            _ => return Err(misplaced("tag", parent)),
        }
        Ok(Frame::Tag)
    }

    fn complete_node(&mut self, node: NodeBuilder) -> Result<()> {
        let ImportState::Ready(region) = &mut self.state else {
            return Err(Error::BeforeBounds { element: "node" });
        };
        let Some(tile) = region.geo_map.grid_index(node.pos) else {
            trace!(id = node.id; "Discarding node outside the grid");
            self.stats.nodes_discarded += 1;
            return Ok(());
        };
        let node = node.finish(u32::try_from(tile)?);

        for (consumer, buffer) in self.consumers.iter_mut().zip(region.tiles.tile_mut(tile)) {
            consumer.import_node(&node, buffer)?;
        }
        self.stats.nodes_stored += 1;
        let id = node.id;
        if self.world.nodes.insert(id, node).is_some() {
            warn!(id = id; "Duplicate node id, keeping the later record");
        }
        Ok(())
    }

    fn complete_way(&mut self, way: WayBuilder) -> Result<()> {
        let ImportState::Ready(region) = &mut self.state else {
            return Err(Error::BeforeBounds { element: "way" });
        };
        // Ways have no position of their own; they follow their first member
        // that made it into the world.
        let tile = way
            .nodes
            .iter()
            .find_map(|id| self.world.nodes.get(id))
            .map(|node| node.tile);
        let Some(tile) = tile else {
            trace!(id = way.id; "Discarding way without stored members");
            self.stats.ways_discarded += 1;
            return Ok(());
        };
        let way = way.finish(tile);
        let tile = usize::try_from(tile)?;

        for (consumer, buffer) in self.consumers.iter_mut().zip(region.tiles.tile_mut(tile)) {
            consumer.import_way(&way, buffer)?;
        }
        self.stats.ways_stored += 1;
        let id = way.id;
        if self.world.ways.insert(id, way).is_some() {
            warn!(id = id; "Duplicate way id, keeping the later record");
        }
        Ok(())
    }
}

fn misplaced(element: &'static str, parent: &'static str) -> Error {
    Error::MisplacedElement { element, parent }
}
