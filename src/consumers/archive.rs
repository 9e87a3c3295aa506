//! Binary record frames: one kind byte (0 = node, 1 = way), the archive
//! length as a little-endian `u32`, then the `rkyv` archive of the record.

use rkyv::AlignedVec;

use super::{TagFilter, TileConsumer};
use crate::data::osm::{Node, Way};
use crate::errors::{Error, Result};
use crate::tiles::TileBuffer;

const CONSUMER_NAME: &str = "archive";
const NODE_KIND: u8 = 0;
const WAY_KIND: u8 = 1;
const FRAME_HEADER_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum ArchivedRecord {
    Node(Node),
    Way(Way),
}

#[derive(Debug, Default)]
pub struct ArchiveConsumer {
    filter: TagFilter,
}

impl ArchiveConsumer {
    pub fn new(filter: TagFilter) -> Self {
        ArchiveConsumer { filter }
    }

    fn append_frame(buffer: &mut TileBuffer, kind: u8, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len())
            .map_err(|err| encoding_error(err.to_string()))?;
        buffer.append(&[kind]);
        buffer.append(&len.to_le_bytes());
        buffer.append(bytes);
        Ok(())
    }

    /// Decodes the frames this consumer appended to one tile buffer. Each
    /// archive is validated before it is deserialized.
    pub fn decode(bytes: &[u8]) -> Result<Vec<ArchivedRecord>> {
        let mut records = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            if rest.len() < FRAME_HEADER_LEN {
                return Err(encoding_error("truncated frame header".to_owned()));
            }
            let kind = rest[0];
            let len = u32::from_le_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
            let end = FRAME_HEADER_LEN + len;
            if rest.len() < end {
                return Err(encoding_error("truncated frame".to_owned()));
            }
            // Archives must be read from an aligned buffer.
            let mut aligned = AlignedVec::with_capacity(len);
            aligned.extend_from_slice(&rest[FRAME_HEADER_LEN..end]);

            let record = match kind {
                NODE_KIND => ArchivedRecord::Node(
                    rkyv::from_bytes::<Node>(&aligned)
                        .map_err(|err| encoding_error(format!("invalid node archive: {err}")))?,
                ),
                WAY_KIND => ArchivedRecord::Way(
                    rkyv::from_bytes::<Way>(&aligned)
                        .map_err(|err| encoding_error(format!("invalid way archive: {err}")))?,
                ),
                other => return Err(encoding_error(format!("unknown frame kind {other}"))),
            };
            records.push(record);
            rest = &rest[end..];
        }
        Ok(records)
    }
}

fn encoding_error(message: String) -> Error {
    Error::Encoding {
        consumer: CONSUMER_NAME,
        message,
    }
}

impl TileConsumer for ArchiveConsumer {
    fn name(&self) -> &'static str {
        CONSUMER_NAME
    }

    fn import_node(&mut self, node: &Node, buffer: &mut TileBuffer) -> Result<()> {
        let node = Node {
            tags: self.filter.apply(&node.tags),
            ..node.clone()
        };
        let bytes = rkyv::to_bytes::<_, 256>(&node)
            .map_err(|err| encoding_error(format!("{err:?}")))?;
        Self::append_frame(buffer, NODE_KIND, &bytes)
    }

    fn import_way(&mut self, way: &Way, buffer: &mut TileBuffer) -> Result<()> {
        let way = Way {
            tags: self.filter.apply(&way.tags),
            ..way.clone()
        };
        let bytes = rkyv::to_bytes::<_, 256>(&way)
            .map_err(|err| encoding_error(format!("{err:?}")))?;
        Self::append_frame(buffer, WAY_KIND, &bytes)
    }
}
