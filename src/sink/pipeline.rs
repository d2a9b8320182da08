use std::fs::OpenOptions;
use std::path::PathBuf;

use super::{BgzfSink, BufferedSink, ChecksumSink, FileSink, Sink, StreamSink, Target};
use crate::output_type::OutputType;
use crate::writer::WriterError;

/// A single wrap step, in application order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    /// Fixed-size write buffer
    Buffer(usize),
    /// MD5 digest written to the given sidecar on close
    Checksum(PathBuf),
    /// BGZF block compression
    BlockCompression,
}

/// Ordered list of layers to apply on top of a raw sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    layers: Vec<Layer>,
}

impl Pipeline {
    /// Plan the layers for `target`.
    ///
    /// `declared` is the type the caller asked for; it decides whether a path
    /// target is a regular file (checksum allowed) or a special file.
    /// `effective` is the type actually written; it decides compression.
    pub fn plan(
        target: &Target,
        declared: OutputType,
        effective: OutputType,
        buffer_size: usize,
        create_checksum: bool,
    ) -> Self {
        let mut layers = Vec::new();

        if let Target::Path(path) = target {
            if buffer_size > 0 {
                layers.push(Layer::Buffer(buffer_size));
            }
            if create_checksum {
                if declared.is_file_type() {
                    layers.push(Layer::Checksum(super::checksum_path(path)));
                } else {
                    log::debug!(
                        "Skipping checksum for special file {}",
                        path.display()
                    );
                }
            }
        }

        if effective == OutputType::CompressedTextFile {
            layers.push(Layer::BlockCompression);
        }

        Self { layers }
    }

    /// Layers in application order, innermost first
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Sidecar written by the checksum layer, if any
    pub fn checksum_path(&self) -> Option<&PathBuf> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Checksum(path) => Some(path),
            _ => None,
        })
    }

    /// Open the raw sink for `target` and apply every layer.
    ///
    /// If a layer cannot be applied, everything opened so far is closed
    /// before the error is returned.
    pub fn open(&self, target: &Target, options: &OpenOptions) -> Result<Box<dyn Sink>, WriterError> {
        let mut sink: Box<dyn Sink> = match target {
            Target::Path(path) => Box::new(FileSink::open(path, options)?),
            Target::Stream(stream) => Box::new(StreamSink::new(stream.clone())),
        };

        for layer in &self.layers {
            log::debug!("Applying output layer {:?}", layer);
            sink = match layer {
                Layer::Buffer(size) => Box::new(BufferedSink::new(sink, *size)),
                Layer::Checksum(sidecar) => {
                    // The sidecar is derived from the target path, so hand
                    // the output path itself to the layer.
                    let Target::Path(path) = target else {
                        return Err(abandon(
                            sink,
                            WriterError::Configuration(format!(
                                "Checksum sidecar {} requires a file target",
                                sidecar.display()
                            )),
                        ));
                    };
                    match ChecksumSink::create(sink, path) {
                        Ok(checksum) => Box::new(checksum),
                        Err((e, inner)) => return Err(abandon(inner, e)),
                    }
                }
                Layer::BlockCompression => Box::new(BgzfSink::new(sink)),
            };
        }

        Ok(sink)
    }
}

/// Close a partially assembled sink and hand back the error that stopped assembly
fn abandon(mut sink: Box<dyn Sink>, error: WriterError) -> WriterError {
    if let Err(close_err) = sink.close() {
        log::warn!(
            "Failed to close partially assembled output after error: {}",
            close_err
        );
    }
    error
}
