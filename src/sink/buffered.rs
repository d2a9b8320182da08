use std::io::{self, BufWriter, Write};

use super::{closed_error, Sink};

/// Write buffer in front of a freshly opened file
pub struct BufferedSink {
    inner: BufWriter<Box<dyn Sink>>,
    closed: bool,
}

impl BufferedSink {
    /// Buffer `inner` with `capacity` bytes
    pub fn new(inner: Box<dyn Sink>, capacity: usize) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity, inner),
            closed: false,
        }
    }

    /// Buffer capacity in bytes
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl std::fmt::Debug for BufferedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedSink")
            .field("capacity", &self.inner.capacity())
            .field("pending", &self.inner.buffer().len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Write for BufferedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed_error());
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.inner.flush()
    }
}

impl Sink for BufferedSink {
    fn position(&self) -> u64 {
        self.inner.get_ref().position() + self.inner.buffer().len() as u64
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let flushed = self.inner.flush();
        // Close the file even when the final flush failed
        let closed = self.inner.get_mut().close();
        flushed.and(closed)
    }
}
