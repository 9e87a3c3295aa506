//! Per-tile scratch storage that consumers append their encoded records to
//! during an import.

use std::io::{self, Write};

/// Capacity reserved for every buffer when the grid is allocated.
pub const INITIAL_BUFFER_CAPACITY: usize = 2;

/// Append-only byte buffer owned by one (tile, consumer) pair.
///
/// Consumers only ever see it through a `&mut` borrow for the duration of a
/// single callback.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TileBuffer {
    bytes: Vec<u8>,
}

impl TileBuffer {
    fn new() -> Self {
        TileBuffer {
            bytes: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Write for TileBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Table of scratch buffers indexed by (tile, consumer slot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBuffers {
    tile_count: usize,
    consumer_count: usize,
    buffers: Vec<TileBuffer>,
}

impl TileBuffers {
    pub fn new(tile_count: usize, consumer_count: usize) -> Self {
        TileBuffers {
            tile_count,
            consumer_count,
            buffers: (0..tile_count * consumer_count)
                .map(|_| TileBuffer::new())
                .collect(),
        }
    }

    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    pub fn consumer_count(&self) -> usize {
        self.consumer_count
    }

    pub fn buffer(&self, tile: usize, slot: usize) -> Option<&TileBuffer> {
        self.position(tile, slot).map(|index| &self.buffers[index])
    }

    pub fn buffer_mut(&mut self, tile: usize, slot: usize) -> Option<&mut TileBuffer> {
        self.position(tile, slot).map(|index| &mut self.buffers[index])
    }

    /// Buffers of one tile, in consumer registration order.
    pub fn tile(&self, tile: usize) -> &[TileBuffer] {
        let start = (tile * self.consumer_count).min(self.buffers.len());
        let end = (start + self.consumer_count).min(self.buffers.len());
        &self.buffers[start..end]
    }

    /// Mutable buffers of one tile, in consumer registration order.
    pub fn tile_mut(&mut self, tile: usize) -> &mut [TileBuffer] {
        let start = (tile * self.consumer_count).min(self.buffers.len());
        let end = (start + self.consumer_count).min(self.buffers.len());
        &mut self.buffers[start..end]
    }

    /// Total number of payload bytes across all buffers.
    pub fn payload_len(&self) -> usize {
        self.buffers.iter().map(TileBuffer::len).sum()
    }

    fn position(&self, tile: usize, slot: usize) -> Option<usize> {
        (tile < self.tile_count && slot < self.consumer_count)
            .then(|| tile * self.consumer_count + slot)
    }
}
