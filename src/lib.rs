//! # varsink - Output Pipelines for Variant Writers
//!
//! `varsink` turns a destination (a path or a caller-supplied stream) and a
//! set of options into a ready-to-use variant writer. It decides which
//! representation to produce, stacks the byte layers that representation
//! needs, and hands the result to a text (VCF) or binary (BCF) backend.
//!
//! ## Key Features
//!
//! - **Output type inference**: `.vcf`, `.bcf` and BGZF-compressed
//!   `.vcf.gz` / `.vcf.bgz` are recognized from the file name; symbolic links
//!   are followed and special files (pipes, devices) are written as streams.
//!
//! - **Layered sinks**: buffering, an MD5 checksum sidecar and BGZF block
//!   compression are applied in a fixed order over any destination.
//!
//! - **On-the-fly indexing**: a linear `.idx` index for plain outputs or a
//!   tabix `.tbi` index for compressed VCF, written when the writer closes.
//!
//! - **Background I/O**: serialization and I/O can run on a dedicated
//!   thread behind a bounded queue.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use varsink::prelude::*;
//!
//! let dictionary: SequenceDictionary =
//!     [SequenceRecord::new("chr1", Some(248_956_422))].into_iter().collect();
//!
//! let mut writer = VariantWriterBuilder::new()
//!     .set_output_path("calls.vcf.gz")
//!     .set_reference_dictionary(dictionary)
//!     .set_option(WriterOption::UseAsyncIo)
//!     .build()?;
//!
//! let mut header = VcfHeader::new();
//! header.add_line(HeaderLine::contig("chr1", Some(248_956_422)));
//! writer.write_header(&header)?;
//!
//! let record = VariantRecordBuilder::new("chr1", 10_177, "A")
//!     .alt("AC")
//!     .quality(29.0)
//!     .filter("PASS")
//!     .build();
//! writer.add(&record)?;
//!
//! let stats = writer.close()?;
//! println!("{}", stats);
//! # Ok::<(), varsink::writer::WriterError>(())
//! ```
//!
//! This produces:
//! ```text
//! calls.vcf.gz       # BGZF-compressed VCF
//! calls.vcf.gz.tbi   # tabix index, written on close
//! ```
//!
//! ## Architecture
//!
//! - [`output_type`]: output representations and inference from a path
//! - [`options`]: boolean writer options and the process-wide default set
//! - [`defaults`]: environment-derived defaults (buffer size, checksum, async I/O)
//! - [`sink`]: byte layers and the pipeline that stacks them
//! - [`index`]: on-the-fly index creators
//! - [`variant`]: header, record and sequence dictionary model
//! - [`writer`]: backends, the asynchronous wrapper and the builder

// Documentation lints
#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod defaults;
pub mod index;
pub mod options;
pub mod output_type;
pub mod sink;
pub mod variant;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::index::{IndexCreator, LinearIndexCreator, TabixIndexCreator};
    pub use crate::options::{
        default_options, set_default_option, unset_default_option, OptionSet, WriterOption,
    };
    pub use crate::output_type::OutputType;
    pub use crate::sink::SharedStream;
    pub use crate::variant::{
        HeaderLine, SequenceDictionary, SequenceRecord, VariantRecord, VariantRecordBuilder,
        VcfHeader,
    };
    pub use crate::writer::{VariantWriter, VariantWriterBuilder, WriterError, WriterStats};
}
