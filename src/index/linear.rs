//! Fixed-width bin index for uncompressed outputs.
//!
//! # File layout (little-endian)
//!
//! ```text
//! magic          b"VSLX"
//! version        u32 (1)
//! bin_width      u32
//! final_position u64
//! n_contigs      u32
//! per contig:
//!   name_len     u32, name bytes
//!   n_features   u64
//!   max_end      u64
//!   n_bins       u32
//!   bins         u64 * n_bins   file position of the first feature in or after the bin
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{sibling_path, IndexCreator, IndexError};
use crate::variant::SequenceDictionary;

/// Extension appended to the output path
pub const LINEAR_INDEX_EXTENSION: &str = ".idx";

/// Default bin width in bases
pub const DEFAULT_BIN_WIDTH: u32 = 8000;

const MAGIC: &[u8; 4] = b"VSLX";
const VERSION: u32 = 1;
const MAX_BINS: u64 = 1 << 20;

#[derive(Debug, Clone)]
struct ContigBins {
    name: String,
    dictionary_index: usize,
    bins: Vec<u64>,
    features: u64,
    max_end: u64,
    last_start: u64,
}

/// Linear index over byte offsets; requires a sequence dictionary
#[derive(Debug, Clone)]
pub struct LinearIndexCreator {
    bin_width: u32,
    output: Option<PathBuf>,
    dictionary: Option<SequenceDictionary>,
    contigs: Vec<ContigBins>,
    finalized: bool,
}

impl Default for LinearIndexCreator {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearIndexCreator {
    /// Creator with [`DEFAULT_BIN_WIDTH`]
    pub fn new() -> Self {
        Self::with_bin_width(DEFAULT_BIN_WIDTH)
    }

    /// Creator with a custom bin width (clamped to at least 1)
    pub fn with_bin_width(bin_width: u32) -> Self {
        Self {
            bin_width: bin_width.max(1),
            output: None,
            dictionary: None,
            contigs: Vec::new(),
            finalized: false,
        }
    }

    /// Bin width in bases
    pub fn bin_width(&self) -> u32 {
        self.bin_width
    }

    /// Largest 1-based position a feature may reach: within `i32` coordinates
    /// and at most 2^20 bins per contig
    pub fn max_position(&self) -> u64 {
        (MAX_BINS * self.bin_width as u64).min(i32::MAX as u64)
    }

    fn bin_of(&self, pos: u64) -> usize {
        (pos.saturating_sub(1) / self.bin_width as u64) as usize
    }

    fn write(&self, path: &Path, final_position: u64) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(MAGIC)?;
        out.write_u32::<LittleEndian>(VERSION)?;
        out.write_u32::<LittleEndian>(self.bin_width)?;
        out.write_u64::<LittleEndian>(final_position)?;
        out.write_u32::<LittleEndian>(self.contigs.len() as u32)?;
        for contig in &self.contigs {
            out.write_u32::<LittleEndian>(contig.name.len() as u32)?;
            out.write_all(contig.name.as_bytes())?;
            out.write_u64::<LittleEndian>(contig.features)?;
            out.write_u64::<LittleEndian>(contig.max_end)?;
            out.write_u32::<LittleEndian>(contig.bins.len() as u32)?;
            for &bin in &contig.bins {
                out.write_u64::<LittleEndian>(bin)?;
            }
        }
        out.flush()
    }
}

impl IndexCreator for LinearIndexCreator {
    fn initialize(
        &mut self,
        output: &Path,
        dictionary: Option<&SequenceDictionary>,
    ) -> Result<(), IndexError> {
        let dictionary = dictionary.ok_or(IndexError::MissingDictionary("Linear index"))?;
        self.output = Some(output.to_path_buf());
        self.dictionary = Some(dictionary.clone());
        self.contigs.clear();
        self.finalized = false;
        Ok(())
    }

    fn add_feature(
        &mut self,
        contig: &str,
        start: u64,
        end: u64,
        position: u64,
    ) -> Result<(), IndexError> {
        if self.finalized {
            return Err(IndexError::Finalized);
        }
        let dictionary = self.dictionary.as_ref().ok_or(IndexError::NotInitialized)?;
        let dictionary_index = dictionary
            .index_of(contig)
            .ok_or_else(|| IndexError::UnknownContig(contig.to_string()))?;
        if end.max(start) > self.max_position() {
            return Err(IndexError::PositionOutOfRange {
                contig: contig.to_string(),
                end: end.max(start),
                max: self.max_position(),
            });
        }

        let start_new_contig = match self.contigs.last() {
            Some(current) if current.dictionary_index == dictionary_index => {
                if start < current.last_start {
                    return Err(IndexError::Unsorted(format!(
                        "{}:{} follows {}:{}",
                        contig, start, contig, current.last_start
                    )));
                }
                false
            }
            Some(current) if current.dictionary_index > dictionary_index => {
                return Err(IndexError::Unsorted(format!(
                    "{} follows {} but precedes it in the sequence dictionary",
                    contig, current.name
                )));
            }
            _ => true,
        };
        if start_new_contig {
            self.contigs.push(ContigBins {
                name: contig.to_string(),
                dictionary_index,
                bins: Vec::new(),
                features: 0,
                max_end: 0,
                last_start: start,
            });
        }

        let last_bin = self.bin_of(end.max(start));
        let Some(current) = self.contigs.last_mut() else {
            return Err(IndexError::NotInitialized);
        };

        // Empty bins before this feature point at it
        while current.bins.len() <= last_bin {
            current.bins.push(position);
        }
        current.features += 1;
        current.max_end = current.max_end.max(end);
        current.last_start = start;
        Ok(())
    }

    fn finalize(&mut self, final_position: u64) -> Result<PathBuf, IndexError> {
        if self.finalized {
            return Err(IndexError::Finalized);
        }
        let output = self.output.as_ref().ok_or(IndexError::NotInitialized)?;
        let path = sibling_path(output, LINEAR_INDEX_EXTENSION);
        self.write(&path, final_position)
            .map_err(|source| IndexError::Io {
                path: path.clone(),
                source,
            })?;
        self.finalized = true;
        Ok(path)
    }

    fn clone_box(&self) -> Box<dyn IndexCreator> {
        Box::new(Self::with_bin_width(self.bin_width))
    }
}
