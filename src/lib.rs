//! Converts a map export into a tiled binary container.
//!
//! The export is read in a single forward pass. Every node and way inside the
//! declared bounds is projected onto a flat metric plane, assigned to a tile
//! of an odd-sized grid centered on the region, and handed to each registered
//! [`consumers::TileConsumer`], which encodes it into that tile's scratch
//! buffer. The buffers are then written out as one seekable file with a
//! leading tile directory.

pub mod config;
pub mod consumers;
pub mod container;
pub mod data;
pub mod errors;
pub mod etl;
pub mod geo;
pub mod import;
pub mod source;
pub mod tiles;

pub use errors::{Error, ErrorKind, Result};
