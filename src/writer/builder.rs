use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use super::{
    AsyncVariantWriter, BackendOptions, VariantWriter, WriterError, WriterFactory,
};
use crate::defaults::Defaults;
use crate::index::IndexCreator;
use crate::options::{default_options, OptionSet, WriterOption};
use crate::output_type::OutputType;
use crate::sink::{Pipeline, SharedStream, Target};
use crate::variant::SequenceDictionary;

/// Fluent configuration for variant writers.
///
/// A builder is reusable: every [`build`](Self::build) call works from the
/// current settings and leaves them untouched, so the same builder can
/// produce several writers.
///
/// # Example
///
/// ```rust,no_run
/// use varsink::prelude::*;
///
/// # fn main() -> Result<(), WriterError> {
/// let dictionary: SequenceDictionary =
///     [SequenceRecord::new("chr1", Some(248_956_422))].into_iter().collect();
///
/// let mut writer = VariantWriterBuilder::new()
///     .set_output_path("calls.vcf.gz")
///     .set_reference_dictionary(dictionary)
///     .set_create_checksum()
///     .build()?;
///
/// let mut header = VcfHeader::new();
/// header.add_line(HeaderLine::contig("chr1", Some(248_956_422)));
/// writer.write_header(&header)?;
/// writer.add(&VariantRecordBuilder::new("chr1", 10_177, "A").alt("AC").build())?;
/// let stats = writer.close()?;
/// println!("{}", stats);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct VariantWriterBuilder {
    dictionary: Option<SequenceDictionary>,
    target: Option<Target>,
    output_type: OutputType,
    /// Resolution failure of the last path set, raised by `build()`
    resolution_error: Option<String>,
    index_creator: Option<Box<dyn IndexCreator>>,
    buffer_size: usize,
    create_checksum: bool,
    options: OptionSet,
    async_queue_size: usize,
}

impl Default for VariantWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VariantWriterBuilder {
    /// Builder starting from the process-wide defaults.
    ///
    /// The option set is a copy of [`default_options`], plus
    /// [`WriterOption::UseAsyncIo`] when `VARSINK_USE_ASYNC_IO` is enabled.
    pub fn new() -> Self {
        let mut options = default_options();
        if Defaults::global().use_async_io {
            options.insert(WriterOption::UseAsyncIo);
        }
        Self::with_options(options)
    }

    /// Builder starting from an explicit option set, ignoring the
    /// process-wide default options
    pub fn with_options(options: OptionSet) -> Self {
        let defaults = Defaults::global();
        Self {
            dictionary: None,
            target: None,
            output_type: OutputType::Unspecified,
            resolution_error: None,
            index_creator: None,
            buffer_size: defaults.buffer_size,
            create_checksum: defaults.create_md5,
            options,
            async_queue_size: defaults.async_queue_size,
        }
    }

    /// Reference dictionary used for contig validation and index ordering
    pub fn set_reference_dictionary(&mut self, dictionary: SequenceDictionary) -> &mut Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Forget the reference dictionary
    pub fn clear_reference_dictionary(&mut self) -> &mut Self {
        self.dictionary = None;
        self
    }

    /// Write to `path`, inferring the output type from it.
    ///
    /// Resolution failures (for example a symbolic link cycle) are not
    /// reported here; the next [`build`](Self::build) fails with them.
    pub fn set_output_path<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        let path = path.as_ref();
        match OutputType::try_resolve(path) {
            Ok(output_type) => {
                log::debug!("Resolved {} as {}", path.display(), output_type);
                self.output_type = output_type;
                self.resolution_error = None;
            }
            Err(e) => {
                self.output_type = OutputType::Unspecified;
                self.resolution_error = Some(e.to_string());
            }
        }
        self.target = Some(Target::Path(path.to_path_buf()));
        self
    }

    /// Write text VCF to a caller-supplied stream
    pub fn set_output_text_stream<W: Write + Send + 'static>(&mut self, stream: W) -> &mut Self {
        self.set_stream(SharedStream::new(stream), OutputType::TextStream)
    }

    /// Write BCF to a caller-supplied stream
    pub fn set_output_binary_stream<W: Write + Send + 'static>(&mut self, stream: W) -> &mut Self {
        self.set_stream(SharedStream::new(stream), OutputType::BinaryStream)
    }

    /// Write text VCF to a shared stream handle
    pub fn set_output_stream(&mut self, stream: SharedStream) -> &mut Self {
        self.set_stream(stream, OutputType::TextStream)
    }

    fn set_stream(&mut self, stream: SharedStream, output_type: OutputType) -> &mut Self {
        self.target = Some(Target::Stream(stream));
        self.output_type = output_type;
        self.resolution_error = None;
        self
    }

    /// Override the output type inferred from the path.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Configuration`] if the target is not a path or
    /// `output_type` is not a file representation.
    pub fn set_output_file_type(&mut self, output_type: OutputType) -> Result<&mut Self, WriterError> {
        if !matches!(self.target, Some(Target::Path(_))) {
            return Err(WriterError::Configuration(
                "An output file type can only be set for a path target".to_string(),
            ));
        }
        if !output_type.is_file_type() {
            return Err(WriterError::Configuration(format!(
                "{} is not a file output type",
                output_type
            )));
        }
        self.output_type = output_type;
        self.resolution_error = None;
        Ok(self)
    }

    /// Use `creator` instead of the default index creator
    pub fn set_index_creator<C: IndexCreator + 'static>(&mut self, creator: C) -> &mut Self {
        self.index_creator = Some(Box::new(creator));
        self
    }

    /// Go back to the default index creator for the output type
    pub fn clear_index_creator(&mut self) -> &mut Self {
        self.index_creator = None;
        self
    }

    /// Buffer size for freshly opened files; 0 disables buffering
    pub fn set_buffer(&mut self, buffer_size: usize) -> &mut Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Disable buffering
    pub fn unset_buffering(&mut self) -> &mut Self {
        self.set_buffer(0)
    }

    /// Write an MD5 sidecar next to file outputs
    pub fn set_create_checksum(&mut self) -> &mut Self {
        self.modify_create_checksum(true)
    }

    /// Enable or disable the MD5 sidecar
    pub fn modify_create_checksum(&mut self, enabled: bool) -> &mut Self {
        self.create_checksum = enabled;
        self
    }

    /// Disable the MD5 sidecar
    pub fn unset_create_checksum(&mut self) -> &mut Self {
        self.modify_create_checksum(false)
    }

    /// Replace the option set
    pub fn set_options(&mut self, options: OptionSet) -> &mut Self {
        self.options = options;
        self
    }

    /// Add a single option
    pub fn set_option(&mut self, option: WriterOption) -> &mut Self {
        self.options.insert(option);
        self
    }

    /// Remove a single option
    pub fn unset_option(&mut self, option: WriterOption) -> &mut Self {
        self.options.remove(option);
        self
    }

    /// Add or remove a single option
    pub fn modify_option(&mut self, option: WriterOption, enabled: bool) -> &mut Self {
        self.options.set(option, enabled);
        self
    }

    /// Remove every option
    pub fn clear_options(&mut self) -> &mut Self {
        self.options.clear();
        self
    }

    /// Capacity of the queue used with [`WriterOption::UseAsyncIo`] (at least 1)
    pub fn set_async_queue_size(&mut self, size: usize) -> &mut Self {
        self.async_queue_size = size.max(1);
        self
    }

    /// Returns `true` if `option` is set
    pub fn is_option_set(&self, option: WriterOption) -> bool {
        self.options.contains(option)
    }

    /// Current option set
    pub fn options(&self) -> OptionSet {
        self.options
    }

    /// Declared output type; never changed by [`WriterOption::ForceBinary`]
    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    /// Buffer size for freshly opened files
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Whether an MD5 sidecar will be written
    pub fn creates_checksum(&self) -> bool {
        self.create_checksum
    }

    /// Build a writer, creating or truncating a file target
    pub fn build(&self) -> Result<Box<dyn VariantWriter>, WriterError> {
        let mut open_options = OpenOptions::new();
        open_options.create(true).truncate(true).write(true);
        self.build_with(&open_options)
    }

    /// Build a writer, opening a file target with `open_options`.
    ///
    /// # Errors
    ///
    /// Configuration problems are reported before any file is opened:
    /// - the last path set could not be resolved
    /// - no path or stream is set
    /// - the output type is unspecified
    /// - indexing a text or binary file without a reference dictionary
    ///
    /// Opening the file or the checksum sidecar can then fail with
    /// [`WriterError::Io`]; anything opened by this call is closed first.
    pub fn build_with(&self, open_options: &OpenOptions) -> Result<Box<dyn VariantWriter>, WriterError> {
        if let Some(message) = &self.resolution_error {
            return Err(WriterError::Configuration(message.clone()));
        }
        let target = self.target.as_ref().ok_or_else(|| {
            WriterError::Configuration("No output path or stream has been set".to_string())
        })?;

        // ForceBinary never touches the declared type
        let mut options = self.options;
        let effective = self
            .output_type
            .retype(options.contains(WriterOption::ForceBinary));

        if effective == OutputType::Unspecified {
            return Err(WriterError::Configuration(format!(
                "Output type is not set and could not be inferred from the output path; \
                 does it have a recognized extension ({})?",
                OutputType::recognized_extensions()
            )));
        }

        if effective.is_stream_type() && options.contains(WriterOption::IndexOnTheFly) {
            log::warn!(
                "Index creation is not supported for {} output; no index will be created",
                effective
            );
            options.remove(WriterOption::IndexOnTheFly);
        }

        if matches!(effective, OutputType::TextFile | OutputType::BinaryFile)
            && options.contains(WriterOption::IndexOnTheFly)
            && self.dictionary.is_none()
        {
            return Err(WriterError::Configuration(
                "A reference dictionary is required for creating indices on the fly".to_string(),
            ));
        }

        let pipeline = Pipeline::plan(
            target,
            self.output_type,
            effective,
            self.buffer_size,
            self.create_checksum,
        );
        log::debug!(
            "Building {} writer with options {:?} and layers {:?}",
            effective,
            options,
            pipeline.layers()
        );

        let path = match target {
            Target::Path(path) => Some(path.clone()),
            Target::Stream(_) => None,
        };
        let factory = WriterFactory::new(effective, BackendOptions::from_options(&options))
            .path(path)
            .dictionary(self.dictionary.clone())
            .index_creator(self.index_creator.as_ref().map(|c| c.clone_box()))
            .checksum_path(pipeline.checksum_path().cloned());

        let sink = pipeline.open(target, open_options)?;
        let writer = factory.create(sink)?;

        if options.contains(WriterOption::UseAsyncIo) {
            Ok(Box::new(AsyncVariantWriter::new(writer, self.async_queue_size)?))
        } else {
            Ok(writer)
        }
    }
}
