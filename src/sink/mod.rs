//! # Output Sink Pipeline
//!
//! Byte-level layers between a serialization backend and the final
//! destination. Every layer implements [`Sink`]: it owns the layer it wraps,
//! accepts bytes through [`std::io::Write`], reports a position for indexing,
//! and closes itself and everything beneath it.
//!
//! ## Layer Order
//!
//! ```text
//! backend ─▶ [bgzf] ─▶ [md5 side-channel] ─▶ [buffer] ─▶ file
//! backend ─▶ [bgzf] ──────────────────────────────────▶ caller stream
//! ```
//!
//! Layers are applied innermost first by [`Pipeline`]:
//!
//! 1. **Buffering**: only for a freshly opened file, skipped when the size is 0
//! 2. **Checksum**: only for a file target with checksums enabled
//! 3. **Block compression**: whenever the effective type is compressed text
//!
//! Asynchronous forwarding is not a byte layer; it wraps the finished backend
//! writer (see [`crate::writer::AsyncVariantWriter`]).

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

mod bgzf;
mod buffered;
mod checksum;
mod file;
mod pipeline;

pub use bgzf::{BgzfSink, BGZF_EOF_MARKER, MAX_BLOCK_SIZE};
pub(crate) use bgzf::compress_block;
pub use buffered::BufferedSink;
pub use checksum::{checksum_path, ChecksumSink};
pub use file::FileSink;
pub use pipeline::{Layer, Pipeline};

/// Byte destination with a position and an explicit close
pub trait Sink: Write + Send {
    /// Position of the next byte, as understood by index creators.
    ///
    /// Plain layers report the number of bytes accepted so far; the BGZF
    /// layer reports a virtual offset.
    fn position(&self) -> u64;

    /// Flush and close this layer and every layer it wraps.
    ///
    /// Closing twice is a no-op. Writing after close fails.
    fn close(&mut self) -> io::Result<()>;
}

impl Sink for Box<dyn Sink> {
    fn position(&self) -> u64 {
        (**self).position()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "sink already closed")
}

/// Where the assembled bytes finally go
#[derive(Debug, Clone)]
pub enum Target {
    /// A file opened by the pipeline
    Path(PathBuf),
    /// A stream supplied by the caller
    Stream(SharedStream),
}

/// Cloneable handle to a caller-supplied stream.
///
/// The builder keeps one handle so that it can build several writers against
/// the same stream; each writer gets its own clone. Closing a writer flushes
/// the stream but the stream itself lives until the last handle is dropped.
#[derive(Clone)]
pub struct SharedStream {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedStream {
    /// Wrap a stream
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "stream lock poisoned"))?;
        f(guard.as_mut())
    }
}

impl std::fmt::Debug for SharedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStream")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

/// Sink over a caller-supplied stream
#[derive(Debug)]
pub struct StreamSink {
    stream: SharedStream,
    written: u64,
    closed: bool,
}

impl StreamSink {
    /// Wrap a stream handle
    pub fn new(stream: SharedStream) -> Self {
        Self {
            stream,
            written: 0,
            closed: false,
        }
    }
}

impl Write for StreamSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed_error());
        }
        let n = self.stream.with(|w| w.write(buf))?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.stream.with(|w| w.flush())
    }
}

impl Sink for StreamSink {
    fn position(&self) -> u64 {
        self.written
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.with(|w| w.flush())
    }
}

#[cfg(test)]
mod tests;
