//! BGZF block compression.
//!
//! Data is cut into blocks of at most [`MAX_BLOCK_SIZE`] bytes. Each block is
//! written as an independent gzip member whose `BC` extra field records the
//! compressed block size, so a reader can seek to any block start.
//!
//! # Block layout
//!
//! Standard gzip header (10 bytes):
//! - ID1=31, ID2=139 (gzip magic)
//! - CM=8 (deflate)
//! - FLG=4 (FEXTRA flag set)
//! - MTIME=0, XFL=0, OS=255
//!
//! Extra field (2 + 6 bytes):
//! - XLEN=6
//! - SI1='B', SI2='C', SLEN=2
//! - BSIZE (little-endian u16): total block size - 1
//!
//! Raw deflate data, then CRC32 and ISIZE of the uncompressed data.
//!
//! # Virtual offsets
//!
//! [`BgzfSink::position`] returns `(block_start << 16) | offset_in_block`,
//! where `block_start` is the compressed offset of the block currently being
//! filled. This is the position format tabix indexes store.

use std::io::{self, Write};

use flate2::write::DeflateEncoder;
use flate2::Compression;

use super::{closed_error, Sink};

/// Maximum uncompressed bytes per block
pub const MAX_BLOCK_SIZE: usize = 0xff00;

/// Empty block terminating every BGZF stream
pub const BGZF_EOF_MARKER: [u8; 28] = [
    31, 139, 8, 4, 0, 0, 0, 0, 0, 255, // Header (10 bytes)
    6, 0, 66, 67, 2, 0, 27, 0, // Extra field with BSIZE=27 (8 bytes)
    3, 0, // Empty deflate block (2 bytes)
    0, 0, 0, 0, // CRC32 (4 bytes)
    0, 0, 0, 0, // ISIZE=0 (4 bytes)
];

/// BGZF encoder over any [`Sink`]
pub struct BgzfSink {
    inner: Box<dyn Sink>,
    block: Vec<u8>,
    /// Compressed bytes emitted so far
    block_start: u64,
    level: Compression,
    closed: bool,
}

impl BgzfSink {
    /// Compress into `inner` at the default level
    pub fn new(inner: Box<dyn Sink>) -> Self {
        Self::with_level(inner, Compression::default())
    }

    /// Compress into `inner` at `level`
    pub fn with_level(inner: Box<dyn Sink>, level: Compression) -> Self {
        Self {
            inner,
            block: Vec::with_capacity(MAX_BLOCK_SIZE),
            block_start: 0,
            level,
            closed: false,
        }
    }

    fn emit_block(&mut self) -> io::Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }
        let compressed = compress_block(&self.block, self.level)?;
        self.inner.write_all(&compressed)?;
        self.block_start += compressed.len() as u64;
        self.block.clear();
        Ok(())
    }
}

impl std::fmt::Debug for BgzfSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BgzfSink")
            .field("block_start", &self.block_start)
            .field("pending", &self.block.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Write for BgzfSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed_error());
        }
        let room = MAX_BLOCK_SIZE - self.block.len();
        let n = room.min(buf.len());
        self.block.extend_from_slice(&buf[..n]);
        if self.block.len() == MAX_BLOCK_SIZE {
            self.emit_block()?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.emit_block()?;
        self.inner.flush()
    }
}

impl Sink for BgzfSink {
    fn position(&self) -> u64 {
        (self.block_start << 16) | self.block.len() as u64
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let finished = self
            .emit_block()
            .and_then(|()| self.inner.write_all(&BGZF_EOF_MARKER));
        let closed = self.inner.close();
        finished.and(closed)
    }
}

/// Compress a single block to BGZF format
pub(crate) fn compress_block(data: &[u8], level: Compression) -> io::Result<Vec<u8>> {
    let mut deflate = DeflateEncoder::new(Vec::new(), level);
    deflate.write_all(data)?;
    let deflated = deflate.finish()?;

    let crc = crc32fast::hash(data);
    let isize = data.len() as u32;

    let mut block = Vec::with_capacity(deflated.len() + 26);

    // Header (10 bytes)
    block.push(31); // ID1
    block.push(139); // ID2
    block.push(8); // CM (deflate)
    block.push(4); // FLG (FEXTRA)
    block.extend_from_slice(&[0, 0, 0, 0]); // MTIME
    block.push(0); // XFL
    block.push(255); // OS (unknown)

    // Extra field
    block.extend_from_slice(&6u16.to_le_bytes()); // XLEN=6
    block.push(b'B'); // SI1
    block.push(b'C'); // SI2
    block.extend_from_slice(&2u16.to_le_bytes()); // SLEN=2
    let bsize_pos = block.len();
    block.extend_from_slice(&0u16.to_le_bytes()); // BSIZE (placeholder)

    block.extend_from_slice(&deflated);
    block.extend_from_slice(&crc.to_le_bytes());
    block.extend_from_slice(&isize.to_le_bytes());

    let bsize = u16::try_from(block.len() - 1).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("BGZF block of {} bytes exceeds 64 KiB", block.len()),
        )
    })?;
    block[bsize_pos..bsize_pos + 2].copy_from_slice(&bsize.to_le_bytes());

    Ok(block)
}
