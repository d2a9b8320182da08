//! Tabix index for BGZF-compressed VCF.
//!
//! Features are placed in the UCSC binning scheme (37,450 bins over 512 Mbp)
//! and a linear index of 16 kb windows, both holding BGZF virtual offsets.
//! The index file is itself BGZF-compressed.
//!
//! ## Header
//! - Magic: "TBI\1" (4 bytes)
//! - n_ref, format (2 = VCF), col_seq (1), col_beg (2), col_end (0),
//!   meta (`#`), skip (0): int32 each
//! - l_nm (int32), then NUL-terminated sequence names
//!
//! ## Per reference
//! - n_bin (int32); per bin: bin (uint32), n_chunk (int32), chunks (2 x uint64)
//! - n_intv (int32), then uint64 offsets

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;

use super::{sibling_path, IndexCreator, IndexError};
use crate::sink::{BGZF_EOF_MARKER, MAX_BLOCK_SIZE};
use crate::variant::SequenceDictionary;

/// Extension appended to the output path
pub const TABIX_INDEX_EXTENSION: &str = ".tbi";

const TBI_MAGIC: &[u8; 4] = b"TBI\x01";
const FORMAT_VCF: i32 = 2;
const COL_SEQ: i32 = 1;
const COL_BEG: i32 = 2;
const COL_END: i32 = 0;
const META_CHAR: i32 = b'#' as i32;
const LINEAR_SHIFT: u32 = 14;

/// Largest 1-based position the binning scheme covers
pub const TABIX_MAX_POSITION: u64 = 1 << 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    beg: u64,
    end: u64,
}

#[derive(Debug, Clone, Default)]
struct ReferenceIndex {
    bins: BTreeMap<u32, Vec<Chunk>>,
    linear: Vec<Option<u64>>,
}

impl ReferenceIndex {
    fn add(&mut self, beg: u64, end: u64, chunk: Chunk) {
        let chunks = self.bins.entry(reg2bin(beg, end)).or_default();
        match chunks.last_mut() {
            Some(last) if last.end == chunk.beg => last.end = chunk.end,
            _ => chunks.push(chunk),
        }

        let first_window = (beg >> LINEAR_SHIFT) as usize;
        let last_window = ((end - 1) >> LINEAR_SHIFT) as usize;
        if self.linear.len() <= last_window {
            self.linear.resize(last_window + 1, None);
        }
        for slot in &mut self.linear[first_window..=last_window] {
            if slot.is_none() {
                *slot = Some(chunk.beg);
            }
        }
    }

    /// Linear index with empty windows inheriting the previous offset
    fn filled_linear(&self) -> Vec<u64> {
        let mut previous = 0;
        self.linear
            .iter()
            .map(|slot| {
                if let Some(offset) = slot {
                    previous = *offset;
                }
                previous
            })
            .collect()
    }
}

/// Feature waiting for the position where its bytes end
#[derive(Debug, Clone, Copy)]
struct Pending {
    reference: usize,
    beg: u64,
    end: u64,
    position: u64,
}

/// Tabix index over BGZF virtual offsets
#[derive(Debug, Clone, Default)]
pub struct TabixIndexCreator {
    output: Option<PathBuf>,
    names: Vec<String>,
    ids: HashMap<String, usize>,
    from_dictionary: bool,
    references: Vec<ReferenceIndex>,
    current: Option<usize>,
    last_start: u64,
    pending: Option<Pending>,
    finalized: bool,
}

impl TabixIndexCreator {
    /// New creator; contig order comes from the dictionary given at
    /// initialization, or from first appearance without one
    pub fn new() -> Self {
        Self::default()
    }

    fn reference_id(&mut self, contig: &str) -> Result<usize, IndexError> {
        if let Some(&id) = self.ids.get(contig) {
            return Ok(id);
        }
        if self.from_dictionary {
            return Err(IndexError::UnknownContig(contig.to_string()));
        }
        let id = self.names.len();
        self.names.push(contig.to_string());
        self.ids.insert(contig.to_string(), id);
        self.references.push(ReferenceIndex::default());
        Ok(id)
    }

    fn commit(&mut self, chunk_end: u64) {
        if let Some(pending) = self.pending.take() {
            let chunk = Chunk {
                beg: pending.position,
                end: chunk_end,
            };
            self.references[pending.reference].add(pending.beg, pending.end, chunk);
        }
    }

    fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        out.write_all(TBI_MAGIC)?;
        out.write_i32::<LittleEndian>(self.names.len() as i32)?;
        out.write_i32::<LittleEndian>(FORMAT_VCF)?;
        out.write_i32::<LittleEndian>(COL_SEQ)?;
        out.write_i32::<LittleEndian>(COL_BEG)?;
        out.write_i32::<LittleEndian>(COL_END)?;
        out.write_i32::<LittleEndian>(META_CHAR)?;
        out.write_i32::<LittleEndian>(0)?; // skip

        let names_len: usize = self.names.iter().map(|n| n.len() + 1).sum();
        out.write_i32::<LittleEndian>(names_len as i32)?;
        for name in &self.names {
            out.write_all(name.as_bytes())?;
            out.write_u8(0)?;
        }

        for reference in &self.references {
            out.write_i32::<LittleEndian>(reference.bins.len() as i32)?;
            for (bin, chunks) in &reference.bins {
                out.write_u32::<LittleEndian>(*bin)?;
                out.write_i32::<LittleEndian>(chunks.len() as i32)?;
                for chunk in chunks {
                    out.write_u64::<LittleEndian>(chunk.beg)?;
                    out.write_u64::<LittleEndian>(chunk.end)?;
                }
            }
            let linear = reference.filled_linear();
            out.write_i32::<LittleEndian>(linear.len() as i32)?;
            for offset in linear {
                out.write_u64::<LittleEndian>(offset)?;
            }
        }
        Ok(out)
    }

    fn write(&self, path: &Path) -> std::io::Result<()> {
        let payload = self.encode()?;
        let mut out = BufWriter::new(File::create(path)?);
        for block in payload.chunks(MAX_BLOCK_SIZE) {
            out.write_all(&crate::sink::compress_block(block, Compression::default())?)?;
        }
        out.write_all(&BGZF_EOF_MARKER)?;
        out.flush()
    }
}

impl IndexCreator for TabixIndexCreator {
    fn initialize(
        &mut self,
        output: &Path,
        dictionary: Option<&SequenceDictionary>,
    ) -> Result<(), IndexError> {
        *self = Self::new();
        self.output = Some(output.to_path_buf());
        if let Some(dictionary) = dictionary {
            self.from_dictionary = true;
            for (id, sequence) in dictionary.sequences().iter().enumerate() {
                self.names.push(sequence.name.clone());
                self.ids.insert(sequence.name.clone(), id);
                self.references.push(ReferenceIndex::default());
            }
        }
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
        if self.output.is_none() {
            return Err(IndexError::NotInitialized);
        }
        if end.max(start) > TABIX_MAX_POSITION {
            return Err(IndexError::PositionOutOfRange {
                contig: contig.to_string(),
                end: end.max(start),
                max: TABIX_MAX_POSITION,
            });
        }

        let reference = self.reference_id(contig)?;
        match self.current {
            Some(current) if reference < current => {
                return Err(IndexError::Unsorted(format!(
                    "{} appears after {}",
                    contig, self.names[current]
                )));
            }
            Some(current) if reference == current && start < self.last_start => {
                return Err(IndexError::Unsorted(format!(
                    "{}:{} follows {}:{}",
                    contig, start, contig, self.last_start
                )));
            }
            _ => {}
        }

        self.commit(position);
        self.current = Some(reference);
        self.last_start = start;

        let beg = start.saturating_sub(1);
        self.pending = Some(Pending {
            reference,
            beg,
            end: end.max(beg + 1),
            position,
        });
        Ok(())
    }

    fn finalize(&mut self, final_position: u64) -> Result<PathBuf, IndexError> {
        if self.finalized {
            return Err(IndexError::Finalized);
        }
        let output = self.output.clone().ok_or(IndexError::NotInitialized)?;
        self.commit(final_position);

        let path = sibling_path(&output, TABIX_INDEX_EXTENSION);
        self.write(&path).map_err(|source| IndexError::Io {
            path: path.clone(),
            source,
        })?;
        self.finalized = true;
        Ok(path)
    }

    fn clone_box(&self) -> Box<dyn IndexCreator> {
        Box::new(Self::new())
    }
}

/// Smallest bin fully containing the 0-based half-open region `[beg, end)`
fn reg2bin(beg: u64, end: u64) -> u32 {
    let end = end - 1;
    for level in (1..=5u32).rev() {
        let shift = 29 - 3 * level;
        if beg >> shift == end >> shift {
            let offset = ((1u64 << (3 * level)) - 1) / 7;
            return (offset + (beg >> shift)) as u32;
        }
    }
    0
}
