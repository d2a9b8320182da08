//! # On-the-fly Index Creation
//!
//! Index creators receive one `add_feature` call per record, in file order,
//! carrying the position of the record in the output. When the writer is
//! closed the creator is finalized and writes its index next to the output.
//!
//! | Creator | Output | Positions |
//! |---------|--------|-----------|
//! | [`LinearIndexCreator`] | `<path>.idx` | byte offsets |
//! | [`TabixIndexCreator`] | `<path>.tbi` | BGZF virtual offsets |
//!
//! Both require records sorted by contig, then by start.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::variant::{SequenceDictionary, VariantRecord};

mod linear;
mod tabix;

pub use linear::{LinearIndexCreator, DEFAULT_BIN_WIDTH, LINEAR_INDEX_EXTENSION};
pub use tabix::{TabixIndexCreator, TABIX_INDEX_EXTENSION, TABIX_MAX_POSITION};

/// Errors raised while building or writing an index
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Feature added before `initialize`
    #[error("Index creator used before initialization")]
    NotInitialized,

    /// Feature added or finalize called after the index was written
    #[error("Index already finalized")]
    Finalized,

    /// Records not sorted by contig and start
    #[error("Input is not sorted: {0}")]
    Unsorted(String),

    /// Contig missing from the sequence dictionary
    #[error("Contig {0} is not in the sequence dictionary")]
    UnknownContig(String),

    /// Creator needs a dictionary but none was given
    #[error("{0} requires a sequence dictionary")]
    MissingDictionary(&'static str),

    /// Feature ends past the largest position the index format can address
    #[error("{contig}:{end} is beyond the largest indexable position {max}")]
    PositionOutOfRange {
        /// Contig of the feature
        contig: String,
        /// Last base of the feature (1-based)
        end: u64,
        /// Largest position the creator accepts
        max: u64,
    },

    /// Failed writing the index file
    #[error("I/O error writing index {}: {source}", path.display())]
    Io {
        /// Index file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Strategy for building a positional index while records are written
pub trait IndexCreator: Send + fmt::Debug {
    /// Prepare to index the file at `output`
    fn initialize(
        &mut self,
        output: &Path,
        dictionary: Option<&SequenceDictionary>,
    ) -> Result<(), IndexError>;

    /// Record a feature spanning `start..=end` (1-based) on `contig`,
    /// whose bytes begin at `position` in the output
    fn add_feature(
        &mut self,
        contig: &str,
        start: u64,
        end: u64,
        position: u64,
    ) -> Result<(), IndexError>;

    /// Finish the index; `final_position` is the position just past the last
    /// record. Returns the path of the written index.
    fn finalize(&mut self, final_position: u64) -> Result<PathBuf, IndexError>;

    /// Fresh, uninitialized copy with the same settings
    fn clone_box(&self) -> Box<dyn IndexCreator>;
}

impl Clone for Box<dyn IndexCreator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Index path for `output` with `extension` appended to the file name
pub(crate) fn sibling_path(output: &Path, extension: &str) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(extension);
    PathBuf::from(name)
}

/// Drives an [`IndexCreator`] on behalf of a backend writer
#[derive(Debug)]
pub(crate) struct Indexer {
    creator: Box<dyn IndexCreator>,
}

impl Indexer {
    /// Initialize `creator` for `output`
    pub(crate) fn start(
        mut creator: Box<dyn IndexCreator>,
        output: &Path,
        dictionary: Option<&SequenceDictionary>,
    ) -> Result<Self, IndexError> {
        creator.initialize(output, dictionary)?;
        log::debug!("Indexing {} on the fly with {:?}", output.display(), creator);
        Ok(Self { creator })
    }

    /// Report `record`, which is about to be written at `position`
    pub(crate) fn add(&mut self, record: &VariantRecord, position: u64) -> Result<(), IndexError> {
        self.creator
            .add_feature(&record.contig, record.pos, record.end(), position)
    }

    /// Write the index
    pub(crate) fn finish(&mut self, final_position: u64) -> Result<PathBuf, IndexError> {
        let path = self.creator.finalize(final_position)?;
        log::info!("Wrote index {}", path.display());
        Ok(path)
    }
}
