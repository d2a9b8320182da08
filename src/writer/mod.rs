//! # Variant Writer Module
//!
//! Backends that serialize a [`VcfHeader`] and a stream of
//! [`VariantRecord`]s, and the builder that assembles them on top of an
//! output [`sink`](crate::sink) pipeline.
//!
//! ## Design Principles
//!
//! 1. **One construction path**: [`VariantWriterBuilder`] resolves the
//!    output type, assembles the byte pipeline and hands it to
//!    [`WriterFactory`], which picks the text or binary backend.
//!
//! 2. **Fail fast**: configuration problems are reported by `build()` before
//!    any file is opened. A failure after opening closes what was opened.
//!
//! 3. **Explicit close**: [`VariantWriter::close`] flushes every layer,
//!    finalizes the index and returns [`WriterStats`]. Dropping an unclosed
//!    writer closes it on a best-effort basis and logs a warning.
//!
//! 4. **Optional background I/O**: with [`WriterOption::UseAsyncIo`](crate::options::WriterOption::UseAsyncIo)
//!    the backend runs on a dedicated thread behind a bounded queue
//!    ([`AsyncVariantWriter`]).

mod async_writer;
mod backend;
mod bcf;
mod builder;
mod error;
mod factory;
mod stats;
mod vcf;


pub use async_writer::{AsyncVariantWriter, WRITER_THREAD_NAME};
pub use backend::BackendOptions;
pub use bcf::{BcfWriter, BCF_MAGIC};
pub use builder::VariantWriterBuilder;
pub use error::WriterError;
pub use factory::WriterFactory;
pub use stats::WriterStats;
pub use vcf::VcfWriter;

use crate::variant::{VariantRecord, VcfHeader};

/// Serializes a header followed by records
pub trait VariantWriter: Send {
    /// Write the header; must be called exactly once, before any record
    fn write_header(&mut self, header: &VcfHeader) -> Result<(), WriterError>;

    /// Write a single record
    fn add(&mut self, record: &VariantRecord) -> Result<(), WriterError>;

    /// Write a record the caller no longer needs
    fn add_owned(&mut self, record: VariantRecord) -> Result<(), WriterError> {
        self.add(&record)
    }

    /// Push buffered bytes towards the destination
    fn flush(&mut self) -> Result<(), WriterError>;

    /// Report a failure that happened outside the caller's last call
    fn check_error(&self) -> Result<(), WriterError> {
        Ok(())
    }

    /// Flush and close every layer, write the index, and return statistics.
    ///
    /// A second call fails with [`WriterError::Closed`].
    fn close(&mut self) -> Result<WriterStats, WriterError>;
}

impl VariantWriter for Box<dyn VariantWriter> {
    fn write_header(&mut self, header: &VcfHeader) -> Result<(), WriterError> {
        (**self).write_header(header)
    }

    fn add(&mut self, record: &VariantRecord) -> Result<(), WriterError> {
        (**self).add(record)
    }

    fn add_owned(&mut self, record: VariantRecord) -> Result<(), WriterError> {
        (**self).add_owned(record)
    }

    fn flush(&mut self) -> Result<(), WriterError> {
        (**self).flush()
    }

    fn check_error(&self) -> Result<(), WriterError> {
        (**self).check_error()
    }

    fn close(&mut self) -> Result<WriterStats, WriterError> {
        (**self).close()
    }
}
