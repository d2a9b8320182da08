//! State shared by the text and binary backends.

use std::io::Write;
use std::path::PathBuf;

use super::{WriterError, WriterStats};
use crate::index::Indexer;
use crate::options::{OptionSet, WriterOption};
use crate::sink::Sink;
use crate::variant::{SequenceDictionary, VariantRecord, VcfHeader};

/// Option flags a backend honors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendOptions {
    /// Feed record positions to an index creator
    pub index_on_the_fly: bool,
    /// Omit FORMAT and per-sample columns
    pub skip_secondary_fields: bool,
    /// Accept keys the header does not declare (text backend only)
    pub allow_missing_header_fields: bool,
    /// Keep trailing missing values in per-sample columns
    pub write_full_format_field: bool,
}

impl BackendOptions {
    /// Select the backend flags from an option set
    pub fn from_options(options: &OptionSet) -> Self {
        Self {
            index_on_the_fly: options.contains(WriterOption::IndexOnTheFly),
            skip_secondary_fields: options.contains(WriterOption::DoNotWriteSecondaryFields),
            allow_missing_header_fields: options.contains(WriterOption::AllowMissingHeaderFields),
            write_full_format_field: options.contains(WriterOption::WriteFullFormatField),
        }
    }
}

/// Destination side of a backend: the assembled sink plus indexing and counters
pub(crate) struct Output {
    sink: Box<dyn Sink>,
    path: Option<PathBuf>,
    dictionary: Option<SequenceDictionary>,
    indexer: Option<Indexer>,
    checksum_path: Option<PathBuf>,
    records_written: u64,
    bytes_written: u64,
    closed: bool,
}

impl Output {
    pub(crate) fn new(
        sink: Box<dyn Sink>,
        path: Option<PathBuf>,
        dictionary: Option<SequenceDictionary>,
        indexer: Option<Indexer>,
        checksum_path: Option<PathBuf>,
    ) -> Self {
        Self {
            sink,
            path,
            dictionary,
            indexer,
            checksum_path,
            records_written: 0,
            bytes_written: 0,
            closed: false,
        }
    }

    pub(crate) fn dictionary(&self) -> Option<&SequenceDictionary> {
        self.dictionary.as_ref()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), WriterError> {
        if self.closed {
            return Err(WriterError::Closed);
        }
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> WriterError {
        match &self.path {
            Some(path) => WriterError::io(path, source),
            None => WriterError::IoError(source),
        }
    }

    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> Result<(), WriterError> {
        self.sink
            .write_all(bytes)
            .map_err(|e| self.io_error(e))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Validate `record` and report its position to the indexer
    pub(crate) fn begin_record(&mut self, record: &VariantRecord) -> Result<(), WriterError> {
        self.ensure_open()?;
        record.validate().map_err(WriterError::InvalidRecord)?;

        if let Some(indexer) = self.indexer.as_mut() {
            if let Some(dictionary) = &self.dictionary {
                if dictionary.index_of(&record.contig).is_none() {
                    return Err(WriterError::InvalidRecord(format!(
                        "Contig {} is not in the reference dictionary",
                        record.contig
                    )));
                }
            }
            indexer.add(record, self.sink.position())?;
        }
        Ok(())
    }

    pub(crate) fn end_record(&mut self) {
        self.records_written += 1;
    }

    pub(crate) fn flush(&mut self) -> Result<(), WriterError> {
        self.sink.flush().map_err(|e| self.io_error(e))
    }

    /// Close the sink, then write the index
    pub(crate) fn close(&mut self) -> Result<WriterStats, WriterError> {
        self.ensure_open()?;
        self.closed = true;

        let final_position = self.sink.position();
        self.sink.close().map_err(|e| self.io_error(e))?;

        let index_path = match self.indexer.as_mut() {
            Some(indexer) => Some(indexer.finish(final_position)?),
            None => None,
        };

        Ok(WriterStats {
            records_written: self.records_written,
            bytes_written: self.bytes_written,
            index_path,
            checksum_path: self.checksum_path.clone(),
        })
    }

}

impl Drop for Output {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let target = self
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stream".to_string());
        log::warn!("Variant writer for {} dropped without close(); closing now", target);
        if let Err(e) = self.close() {
            log::warn!("Closing {} on drop failed: {}", target, e);
        }
    }
}

/// Reject INFO keys, FORMAT keys and filters the header does not declare
pub(crate) fn check_declared(header: &VcfHeader, record: &VariantRecord) -> Result<(), WriterError> {
    for (key, _) in &record.info {
        if !header.has_info(key) {
            return Err(WriterError::InvalidRecord(format!(
                "{}:{}: INFO key {} is not defined in the header",
                record.contig, record.pos, key
            )));
        }
    }
    for key in &record.format {
        if !header.has_format(key) {
            return Err(WriterError::InvalidRecord(format!(
                "{}:{}: FORMAT key {} is not defined in the header",
                record.contig, record.pos, key
            )));
        }
    }
    for filter in &record.filters {
        if !header.has_filter(filter) {
            return Err(WriterError::InvalidRecord(format!(
                "{}:{}: filter {} is not defined in the header",
                record.contig, record.pos, filter
            )));
        }
    }
    Ok(())
}
