use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{closed_error, Sink};
use crate::writer::WriterError;

/// Innermost sink over a file opened by the pipeline
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl FileSink {
    /// Open `path` with the given options
    pub fn open(path: &Path, options: &OpenOptions) -> Result<Self, WriterError> {
        let file = options
            .open(path)
            .map_err(|e| WriterError::io(path, e))?;
        log::debug!("Opened {} for writing", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            written: 0,
        })
    }

    /// Path this sink writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self.file.as_mut().ok_or_else(closed_error)?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Sink for FileSink {
    fn position(&self) -> u64 {
        self.written
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the handle closes the descriptor
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}
