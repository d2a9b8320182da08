//! Variant data model consumed by the writer backends.
//!
//! - [`SequenceDictionary`]: ordered reference contigs, used to validate and
//!   order records when indexing on the fly
//! - [`VcfHeader`]: meta lines and sample names
//! - [`VariantRecord`]: a single site with its per-sample values

mod dictionary;
mod header;
mod record;

pub use dictionary::{SequenceDictionary, SequenceRecord};
pub use header::{HeaderLine, VcfHeader};
pub use record::{VariantRecord, VariantRecordBuilder};
