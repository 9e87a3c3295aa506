//! The tiled container file: a directory of (offset, length) pairs, one per
//! tile in row-major order, followed by the concatenated tile payloads.
//!
//! Each entry is two little-endian `i64`s. Offsets are absolute file
//! positions. A tile's payload is every consumer's scratch buffer for that
//! tile, back to back in consumer registration order. There is no header.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{info, warn};

use crate::errors::Result;
use crate::tiles::TileBuffers;

pub const DIRECTORY_ENTRY_LEN: usize = 16;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TileDirectoryEntry {
    pub offset: i64,
    pub length: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDirectory {
    entries: Vec<TileDirectoryEntry>,
}

impl TileDirectory {
    /// Zero-filled directory used to reserve space before payloads are known.
    pub fn placeholder(tile_count: usize) -> Self {
        TileDirectory {
            entries: vec![TileDirectoryEntry::default(); tile_count],
        }
    }

    pub fn entries(&self) -> &[TileDirectoryEntry] {
        &self.entries
    }

    pub fn entry(&self, tile: usize) -> Option<TileDirectoryEntry> {
        self.entries.get(tile).copied()
    }

    pub fn tile_count(&self) -> usize {
        self.entries.len()
    }

    pub fn encoded_len(&self) -> usize {
        self.entries.len() * DIRECTORY_ENTRY_LEN
    }

    /// Sum of all tile lengths.
    pub fn payload_len(&self) -> i64 {
        self.entries.iter().map(|entry| entry.length).sum()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for entry in &self.entries {
            out.write_all(&entry.offset.to_le_bytes())?;
            out.write_all(&entry.length.to_le_bytes())?;
        }
        Ok(())
    }

    /// Reads a directory of `tile_count` entries. The container does not
    /// record its own grid size, so the caller must know it.
    pub fn read_from<R: Read>(input: &mut R, tile_count: usize) -> Result<Self> {
        let mut entries = Vec::with_capacity(tile_count);
        let mut offset = [0u8; 8];
        let mut length = [0u8; 8];
        for _ in 0..tile_count {
            input.read_exact(&mut offset)?;
            input.read_exact(&mut length)?;
            entries.push(TileDirectoryEntry {
                offset: i64::from_le_bytes(offset),
                length: i64::from_le_bytes(length),
            });
        }
        Ok(TileDirectory { entries })
    }

    /// Reads the payload of one tile. Returns `None` for tiles outside the
    /// directory.
    pub fn read_tile<R: Read + Seek>(&self, input: &mut R, tile: usize) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self.entry(tile) else {
            return Ok(None);
        };
        input.seek(SeekFrom::Start(u64::try_from(entry.offset)?))?;
        let length = u64::try_from(entry.length)?;
        let mut payload = Vec::new();
        input.by_ref().take(length).read_to_end(&mut payload)?;
        if payload.len() as u64 != length {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(Some(payload))
    }
}

/// Writes the directory and every tile payload to `out`, then rewrites the
/// directory with the real offsets.
pub fn write_container<W: Write + Seek>(out: &mut W, tiles: &TileBuffers) -> Result<TileDirectory> {
    let directory_position = out.stream_position()?;
    let mut directory = TileDirectory::placeholder(tiles.tile_count());
    directory.write_to(out)?;

    for (tile, entry) in directory.entries.iter_mut().enumerate() {
        let offset = out.stream_position()?;
        for buffer in tiles.tile(tile) {
            out.write_all(buffer.as_bytes())?;
        }
        let end = out.stream_position()?;
        *entry = TileDirectoryEntry {
            offset: i64::try_from(offset)?,
            length: i64::try_from(end - offset)?,
        };
    }

    // Overwrite the placeholder directory.
    out.seek(SeekFrom::Start(directory_position))?;
    directory.write_to(out)?;
    out.seek(SeekFrom::End(0))?;
    out.flush()?;
    Ok(directory)
}

/// Creates `path` and writes the container into it. A partially written file
/// is removed if writing fails.
pub fn write_container_file(path: &Path, tiles: &TileBuffers) -> Result<TileDirectory> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let result = write_container(&mut writer, tiles);
    drop(writer);
    let path_text = path.display().to_string();

    match result {
        Ok(directory) => {
            info!(
                path = path_text.as_str(),
                tiles = directory.tile_count(),
                payload_bytes = directory.payload_len();
                "Wrote tile container"
            );
            Ok(directory)
        }
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(path) {
                let message = remove_err.to_string();
                warn!(
                    path = path_text.as_str(),
                    err = message.as_str();
                    "Could not remove partial container"
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rstest::rstest;
    use std::io::Cursor;

    fn sample_tiles() -> TileBuffers {
        let mut tiles = TileBuffers::new(25, 2);
        tiles.tile_mut(0)[0].append(b"abc");
        tiles.tile_mut(0)[1].append(b"de");
        tiles.tile_mut(12)[1].append(b"center");
        tiles.tile_mut(24)[0].append(b"z");
        tiles
    }

    fn entry(offset: i64, length: i64) -> TileDirectoryEntry {
        TileDirectoryEntry { offset, length }
    }

    #[test]
    fn directory_precedes_concatenated_payloads() -> Result<()> {
        let mut out = Cursor::new(Vec::new());
        let directory = write_container(&mut out, &sample_tiles())?;
        let bytes = out.into_inner();

        assert_eq!(directory.tile_count(), 25);
        assert_eq!(directory.encoded_len(), 400);
        assert_eq!(&bytes[400..405], b"abcde");

        let first = directory.entry(0).expect("tile 0");
        assert_eq!(first, entry(400, 5));
        let center = directory.entry(12).expect("tile 12");
        assert_eq!(center, entry(405, 6));
        let empty = directory.entry(5).expect("tile 5");
        assert_eq!(empty, entry(405, 0));
        Ok(())
    }

    #[test]
    fn lengths_account_for_every_payload_byte() -> Result<()> {
        let mut out = Cursor::new(Vec::new());
        let directory = write_container(&mut out, &sample_tiles())?;
        let file_len = out.into_inner().len() as i64;
        let directory_len = directory.encoded_len() as i64;
        assert_eq!(directory.payload_len(), file_len - directory_len);
        Ok(())
    }

    #[test]
    fn written_directory_reads_back() -> Result<()> {
        let mut out = Cursor::new(Vec::new());
        let written = write_container(&mut out, &sample_tiles())?;

        out.set_position(0);
        let read = TileDirectory::read_from(&mut out, 25)?;
        assert_eq!(read, written);
        assert_eq!(read.read_tile(&mut out, 12)?, Some(b"center".to_vec()));
        assert_eq!(read.read_tile(&mut out, 25)?, None);
        Ok(())
    }

    #[rstest]
    #[case::negative_offset(-1, 4)]
    #[case::negative_length(400, -4)]
    fn corrupt_entries_are_malformed_input(#[case] offset: i64, #[case] length: i64) {
        let mut encoded = offset.to_le_bytes().to_vec();
        encoded.extend_from_slice(&length.to_le_bytes());
        let directory = TileDirectory::read_from(&mut Cursor::new(encoded), 1)
            .expect("one entry");

        let mut out = Cursor::new(vec![0u8; 500]);
        let err = directory.read_tile(&mut out, 0).expect_err("corrupt");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn entries_past_the_end_are_truncated_payloads() -> Result<()> {
        let mut out = Cursor::new(Vec::new());
        write_container(&mut out, &sample_tiles())?;
        let directory = TileDirectory {
            entries: vec![entry(405, 1000)],
        };

        let err = directory.read_tile(&mut out, 0).expect_err("short payload");
        assert_eq!(err.kind(), ErrorKind::Io);
        Ok(())
    }

    #[test]
    fn container_file_lands_on_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("map.tiles");
        let directory = write_container_file(&path, &sample_tiles())?;

        let mut file = File::open(&path)?;
        assert_eq!(TileDirectory::read_from(&mut file, 25)?, directory);
        assert_eq!(fs::metadata(&path)?.len(), 400 + 12);
        Ok(())
    }

    #[test]
    fn missing_destination_directory_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("map.tiles");
        let err = write_container_file(&path, &sample_tiles())
            .expect_err("parent does not exist");
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
