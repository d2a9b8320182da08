use std::fmt;
use std::path::PathBuf;

/// Statistics from a closed writer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Number of records written
    pub records_written: u64,
    /// Uncompressed bytes produced by the backend, header included
    pub bytes_written: u64,
    /// Index written on close, if indexing on the fly
    pub index_path: Option<PathBuf>,
    /// Checksum sidecar written on close, if any
    pub checksum_path: Option<PathBuf>,
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} records ({} bytes)",
            self.records_written, self.bytes_written
        )?;
        if let Some(index) = &self.index_path {
            write!(f, ", index {}", index.display())?;
        }
        if let Some(checksum) = &self.checksum_path {
            write!(f, ", checksum {}", checksum.display())?;
        }
        Ok(())
    }
}
