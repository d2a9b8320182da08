use std::path::PathBuf;

use super::backend::{BackendOptions, Output};
use super::{BcfWriter, VariantWriter, VcfWriter, WriterError};
use crate::index::{IndexCreator, Indexer, LinearIndexCreator, TabixIndexCreator};
use crate::output_type::OutputType;
use crate::sink::Sink;
use crate::variant::SequenceDictionary;

/// Selects and constructs the backend for an assembled sink
#[derive(Debug)]
pub struct WriterFactory {
    output_type: OutputType,
    path: Option<PathBuf>,
    dictionary: Option<SequenceDictionary>,
    index_creator: Option<Box<dyn IndexCreator>>,
    options: BackendOptions,
    checksum_path: Option<PathBuf>,
}

impl WriterFactory {
    /// Factory for the effective `output_type`
    pub fn new(output_type: OutputType, options: BackendOptions) -> Self {
        Self {
            output_type,
            path: None,
            dictionary: None,
            index_creator: None,
            options,
            checksum_path: None,
        }
    }

    /// Output file; required for indexing
    pub fn path(mut self, path: Option<PathBuf>) -> Self {
        self.path = path;
        self
    }

    /// Reference dictionary for contig validation and index ordering
    pub fn dictionary(mut self, dictionary: Option<SequenceDictionary>) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Explicit index creator, replacing the default for the output type
    pub fn index_creator(mut self, creator: Option<Box<dyn IndexCreator>>) -> Self {
        self.index_creator = creator;
        self
    }

    /// Checksum sidecar reported in the writer statistics
    pub fn checksum_path(mut self, path: Option<PathBuf>) -> Self {
        self.checksum_path = path;
        self
    }

    /// Creator used when none is set explicitly
    pub fn default_index_creator(output_type: OutputType) -> Box<dyn IndexCreator> {
        match output_type {
            OutputType::CompressedTextFile => Box::new(TabixIndexCreator::new()),
            _ => Box::new(LinearIndexCreator::new()),
        }
    }

    /// Construct the backend over `sink`.
    ///
    /// Fails with [`WriterError::Configuration`] for
    /// [`OutputType::Unspecified`]. The builder rejects that type before
    /// opening anything; callers assembling their own sink reach this check
    /// instead. The sink is closed before an error is returned.
    pub fn create(mut self, mut sink: Box<dyn Sink>) -> Result<Box<dyn VariantWriter>, WriterError> {
        let indexer = match self.prepare() {
            Ok(indexer) => indexer,
            Err(e) => {
                if let Err(close_err) = sink.close() {
                    log::warn!("Failed to close output after backend error: {}", close_err);
                }
                return Err(e);
            }
        };

        log::debug!(
            "Creating {} backend (indexing: {})",
            self.output_type,
            indexer.is_some()
        );
        let binary = self.output_type.is_binary();
        let output = Output::new(
            sink,
            self.path,
            self.dictionary,
            indexer,
            self.checksum_path,
        );
        if binary {
            Ok(Box::new(BcfWriter::new(output, self.options)))
        } else {
            Ok(Box::new(VcfWriter::new(output, self.options)))
        }
    }

    /// Checks that can fail, run before the sink is handed to a backend
    fn prepare(&mut self) -> Result<Option<Indexer>, WriterError> {
        if self.output_type == OutputType::Unspecified {
            return Err(WriterError::Configuration(format!(
                "Output type is not set and could not be inferred from the output path; \
                 recognized extensions are {}",
                OutputType::recognized_extensions()
            )));
        }

        match (&self.path, self.options.index_on_the_fly) {
            (Some(path), true) => {
                let creator = self
                    .index_creator
                    .take()
                    .unwrap_or_else(|| Self::default_index_creator(self.output_type));
                Ok(Some(Indexer::start(creator, path, self.dictionary.as_ref())?))
            }
            _ => Ok(None),
        }
    }
}
