//! Binary (BCF) backend.
//!
//! # Layout
//!
//! ```text
//! b"BCF\x02\x02"
//! l_text u32, header text (NUL-terminated)
//! per record:
//!   l_shared u32, l_indiv u32
//!   shared: chrom i32, pos i32 (0-based), rlen i32, qual f32,
//!           n_allele << 16 | n_info u32, n_fmt << 24 | n_sample u32,
//!           id, alleles, filters, info (typed values)
//!   indiv:  per FORMAT key: key offset, one fixed-width string per sample
//! ```
//!
//! INFO keys, FORMAT keys and filters are offsets into the string dictionary
//! built from the header: `PASS` first, then FILTER, INFO and FORMAT ids in
//! declaration order. Contigs are offsets into the header's contig lines, or
//! into the reference dictionary when the header declares none.

use std::collections::HashMap;

use byteorder::{LittleEndian, WriteBytesExt};

use super::backend::{check_declared, BackendOptions, Output};
use super::{VariantWriter, WriterError, WriterStats};
use crate::variant::{HeaderLine, VariantRecord, VcfHeader};

/// Magic bytes and version (2.2)
pub const BCF_MAGIC: &[u8; 5] = b"BCF\x02\x02";

const MISSING_QUAL_BITS: u32 = 0x7F80_0001;
const MAX_SAMPLES: usize = 1 << 24;

const TYPE_INT8: u8 = 1;
const TYPE_INT16: u8 = 2;
const TYPE_INT32: u8 = 3;
const TYPE_CHAR: u8 = 7;

/// Offsets resolved from the header when it is written
#[derive(Debug, Default)]
struct Dictionaries {
    strings: HashMap<String, usize>,
    contigs: HashMap<String, usize>,
}

impl Dictionaries {
    fn from_header(header: &VcfHeader, fallback_contigs: Option<Vec<String>>) -> Self {
        let mut strings = HashMap::new();
        strings.insert("PASS".to_string(), 0);
        for line in header.lines() {
            let id = match line {
                HeaderLine::Filter { id, .. }
                | HeaderLine::Info { id, .. }
                | HeaderLine::Format { id, .. } => id,
                _ => continue,
            };
            let next = strings.len();
            strings.entry(id.clone()).or_insert(next);
        }

        let declared: Vec<String> = header.contigs().into_iter().map(String::from).collect();
        let names = if declared.is_empty() {
            fallback_contigs.unwrap_or_default()
        } else {
            declared
        };
        let contigs = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();

        Self { strings, contigs }
    }

    fn string(&self, key: &str, record: &VariantRecord) -> Result<i32, WriterError> {
        self.strings.get(key).map(|&i| i as i32).ok_or_else(|| {
            WriterError::InvalidRecord(format!(
                "{}:{}: {} is not defined in the header and cannot be encoded in BCF",
                record.contig, record.pos, key
            ))
        })
    }

    fn contig(&self, record: &VariantRecord) -> Result<i32, WriterError> {
        self.contigs
            .get(&record.contig)
            .map(|&i| i as i32)
            .ok_or_else(|| {
                WriterError::InvalidRecord(format!(
                    "Contig {} is not declared in the header or reference dictionary",
                    record.contig
                ))
            })
    }
}

/// Writes the header and records as BCF
pub struct BcfWriter {
    output: Output,
    options: BackendOptions,
    header: Option<VcfHeader>,
    dictionaries: Dictionaries,
    shared: Vec<u8>,
    indiv: Vec<u8>,
}

impl BcfWriter {
    pub(crate) fn new(output: Output, options: BackendOptions) -> Self {
        Self {
            output,
            options,
            header: None,
            dictionaries: Dictionaries::default(),
            shared: Vec::with_capacity(256),
            indiv: Vec::with_capacity(256),
        }
    }

    fn encode_shared(&mut self, record: &VariantRecord, samples: usize) -> Result<(), WriterError> {
        let contig = self.dictionaries.contig(record)?;
        let pos: i32 = narrow(record, "position", record.pos.saturating_sub(1))?;
        let rlen: i32 = narrow(record, "reference length", record.reference.len())?;
        let n_allele: u16 = narrow(record, "allele count", record.alternates.len() + 1)?;
        let n_info: u16 = narrow(record, "INFO count", record.info.len())?;
        let n_fmt: u8 = if samples > 0 {
            narrow(record, "FORMAT count", record.format.len())?
        } else {
            0
        };
        if samples >= MAX_SAMPLES {
            return Err(WriterError::InvalidRecord(format!(
                "{}:{}: {} samples do not fit in BCF",
                record.contig, record.pos, samples
            )));
        }

        let out = &mut self.shared;
        out.clear();
        out.write_i32::<LittleEndian>(contig)?;
        out.write_i32::<LittleEndian>(pos)?;
        out.write_i32::<LittleEndian>(rlen)?;
        let qual = record
            .quality
            .unwrap_or_else(|| f32::from_bits(MISSING_QUAL_BITS));
        out.write_f32::<LittleEndian>(qual)?;
        out.write_u32::<LittleEndian>((u32::from(n_allele) << 16) | u32::from(n_info))?;
        out.write_u32::<LittleEndian>((u32::from(n_fmt) << 24) | samples as u32)?;

        write_typed_str(out, record.id.as_deref().unwrap_or("."))?;
        write_typed_str(out, &record.reference)?;
        for alt in &record.alternates {
            write_typed_str(out, alt)?;
        }

        let filters = record
            .filters
            .iter()
            .map(|f| self.dictionaries.string(f, record))
            .collect::<Result<Vec<_>, _>>()?;
        write_typed_ints(out, &filters)?;

        for (key, value) in &record.info {
            write_typed_int(out, self.dictionaries.string(key, record)?)?;
            match value {
                Some(value) => write_typed_str(out, value)?,
                // Flags are stored as a single int8 set to 1
                None => write_typed_int(out, 1)?,
            }
        }
        Ok(())
    }

    fn encode_indiv(&mut self, record: &VariantRecord, samples: usize) -> Result<(), WriterError> {
        let out = &mut self.indiv;
        out.clear();
        if samples == 0 {
            return Ok(());
        }
        for (k, key) in record.format.iter().enumerate() {
            write_typed_int(out, self.dictionaries.string(key, record)?)?;

            let values: Vec<&str> = (0..samples)
                .map(|s| {
                    record
                        .genotypes
                        .get(s)
                        .and_then(|values| values.get(k))
                        .and_then(|v| v.as_deref())
                        .unwrap_or(".")
                })
                .collect();
            let width = values.iter().map(|v| v.len()).max().unwrap_or(1);
            write_descriptor(out, width, TYPE_CHAR)?;
            for value in values {
                out.extend_from_slice(value.as_bytes());
                out.resize(out.len() + width - value.len(), 0);
            }
        }
        Ok(())
    }
}

impl VariantWriter for BcfWriter {
    fn write_header(&mut self, header: &VcfHeader) -> Result<(), WriterError> {
        self.output.ensure_open()?;
        if self.header.is_some() {
            return Err(WriterError::InvalidRecord(
                "Header has already been written".to_string(),
            ));
        }

        let fallback = self
            .output
            .dictionary()
            .map(|d| d.sequences().iter().map(|s| s.name.clone()).collect());
        self.dictionaries = Dictionaries::from_header(header, fallback);

        let mut text = header
            .to_text(!self.options.skip_secondary_fields)
            .into_bytes();
        text.push(0);

        let mut prefix = Vec::with_capacity(BCF_MAGIC.len() + 4);
        prefix.extend_from_slice(BCF_MAGIC);
        prefix.write_u32::<LittleEndian>(text.len() as u32)?;
        self.output.write_all(&prefix)?;
        self.output.write_all(&text)?;
        self.header = Some(header.clone());
        Ok(())
    }

    fn add(&mut self, record: &VariantRecord) -> Result<(), WriterError> {
        self.output.ensure_open()?;
        let Some(header) = self.header.as_ref() else {
            return Err(WriterError::InvalidRecord(
                "Header must be written before the first record".to_string(),
            ));
        };
        let samples = if self.options.skip_secondary_fields {
            0
        } else {
            header.samples().len()
        };
        if samples > 0 && record.genotypes.len() > samples {
            return Err(WriterError::InvalidRecord(format!(
                "{}:{}: {} samples given but the header declares {}",
                record.contig,
                record.pos,
                record.genotypes.len(),
                samples
            )));
        }
        if !self.options.allow_missing_header_fields {
            check_declared(header, record)?;
        }
        record.validate().map_err(WriterError::InvalidRecord)?;

        self.encode_shared(record, samples)?;
        self.encode_indiv(record, samples)?;

        self.output.begin_record(record)?;
        let mut lengths = [0u8; 8];
        lengths[..4].copy_from_slice(&(self.shared.len() as u32).to_le_bytes());
        lengths[4..].copy_from_slice(&(self.indiv.len() as u32).to_le_bytes());
        self.output.write_all(&lengths)?;
        self.output.write_all(&self.shared)?;
        self.output.write_all(&self.indiv)?;
        self.output.end_record();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WriterError> {
        self.output.flush()
    }

    fn close(&mut self) -> Result<WriterStats, WriterError> {
        self.output.close()
    }
}

/// Type descriptor for `len` values of `ty`; lengths of 15 or more follow as a typed int
/// Fit a record field into its fixed BCF width
fn narrow<T, V>(record: &VariantRecord, what: &str, value: V) -> Result<T, WriterError>
where
    T: TryFrom<V>,
    V: Copy + std::fmt::Display,
{
    T::try_from(value).map_err(|_| {
        WriterError::InvalidRecord(format!(
            "{}:{}: {} {} does not fit in BCF",
            record.contig, record.pos, what, value
        ))
    })
}

fn write_descriptor(out: &mut Vec<u8>, len: usize, ty: u8) -> std::io::Result<()> {
    if len < 15 {
        out.write_u8(((len as u8) << 4) | ty)
    } else {
        out.write_u8(0xF0 | ty)?;
        write_typed_int(out, len as i32)
    }
}

fn int_type(values: &[i32]) -> u8 {
    let (min, max) = values
        .iter()
        .fold((0i32, 0i32), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    // The lowest values of each width are reserved for missing markers
    if min > i8::MIN as i32 + 7 && max <= i8::MAX as i32 {
        TYPE_INT8
    } else if min > i16::MIN as i32 + 7 && max <= i16::MAX as i32 {
        TYPE_INT16
    } else {
        TYPE_INT32
    }
}

fn write_typed_ints(out: &mut Vec<u8>, values: &[i32]) -> std::io::Result<()> {
    let ty = int_type(values);
    write_descriptor(out, values.len(), ty)?;
    for &value in values {
        match ty {
            TYPE_INT8 => out.write_i8(value as i8)?,
            TYPE_INT16 => out.write_i16::<LittleEndian>(value as i16)?,
            _ => out.write_i32::<LittleEndian>(value)?,
        }
    }
    Ok(())
}

fn write_typed_int(out: &mut Vec<u8>, value: i32) -> std::io::Result<()> {
    write_typed_ints(out, &[value])
}

fn write_typed_str(out: &mut Vec<u8>, value: &str) -> std::io::Result<()> {
    write_descriptor(out, value.len(), TYPE_CHAR)?;
    out.extend_from_slice(value.as_bytes());
    Ok(())
}
