//! Text (VCF) backend.

use std::fmt::Write as _;

use super::backend::{check_declared, BackendOptions, Output};
use super::{VariantWriter, WriterError, WriterStats};
use crate::variant::{VariantRecord, VcfHeader};

const MISSING: &str = ".";

/// Writes the header and records as tab-delimited VCF text
pub struct VcfWriter {
    output: Output,
    options: BackendOptions,
    header: Option<VcfHeader>,
    line: String,
}

impl VcfWriter {
    pub(crate) fn new(output: Output, options: BackendOptions) -> Self {
        Self {
            output,
            options,
            header: None,
            line: String::with_capacity(256),
        }
    }

    fn sample_count(&self, header: &VcfHeader) -> usize {
        if self.options.skip_secondary_fields {
            0
        } else {
            header.samples().len()
        }
    }
}

impl VariantWriter for VcfWriter {
    fn write_header(&mut self, header: &VcfHeader) -> Result<(), WriterError> {
        self.output.ensure_open()?;
        if self.header.is_some() {
            return Err(WriterError::InvalidRecord(
                "Header has already been written".to_string(),
            ));
        }
        let text = header.to_text(!self.options.skip_secondary_fields);
        self.output.write_all(text.as_bytes())?;
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
        if !self.options.allow_missing_header_fields {
            check_declared(header, record)?;
        }
        let samples = self.sample_count(header);
        if record.genotypes.len() > samples && !self.options.skip_secondary_fields {
            return Err(WriterError::InvalidRecord(format!(
                "{}:{}: {} samples given but the header declares {}",
                record.contig,
                record.pos,
                record.genotypes.len(),
                samples
            )));
        }

        self.output.begin_record(record)?;

        self.line.clear();
        format_record(
            &mut self.line,
            record,
            samples,
            self.options.write_full_format_field,
        );
        self.output.write_all(self.line.as_bytes())?;
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

/// Append one VCF line (with newline) for `record` to `out`
fn format_record(out: &mut String, record: &VariantRecord, samples: usize, full_format: bool) {
    out.push_str(&record.contig);
    let _ = write!(out, "\t{}\t", record.pos);
    out.push_str(record.id.as_deref().unwrap_or(MISSING));
    out.push('\t');
    out.push_str(&record.reference);
    out.push('\t');
    push_joined(out, &record.alternates, ",");
    out.push('\t');
    match record.quality {
        Some(quality) => out.push_str(&format_quality(quality)),
        None => out.push_str(MISSING),
    }
    out.push('\t');
    push_joined(out, &record.filters, ";");
    out.push('\t');
    if record.info.is_empty() {
        out.push_str(MISSING);
    } else {
        for (i, (key, value)) in record.info.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            out.push_str(key);
            if let Some(value) = value {
                out.push('=');
                out.push_str(value);
            }
        }
    }

    if samples > 0 {
        out.push('\t');
        push_joined(out, &record.format, ":");
        for sample in 0..samples {
            out.push('\t');
            let values = record.genotypes.get(sample).map(Vec::as_slice).unwrap_or(&[]);
            format_sample(out, values, record.format.len(), full_format);
        }
    }
    out.push('\n');
}

fn push_joined(out: &mut String, items: &[String], separator: &str) {
    if items.is_empty() {
        out.push_str(MISSING);
    } else {
        out.push_str(&items.join(separator));
    }
}

/// Per-sample column; trailing missing values are trimmed unless `full_format`
fn format_sample(out: &mut String, values: &[Option<String>], keys: usize, full_format: bool) {
    let width = if full_format {
        keys
    } else {
        values
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |last| last + 1)
    };
    if width == 0 {
        out.push_str(MISSING);
        return;
    }
    for i in 0..width {
        if i > 0 {
            out.push(':');
        }
        match values.get(i) {
            Some(Some(value)) => out.push_str(value),
            _ => out.push_str(MISSING),
        }
    }
}

/// Two decimals, with a whole-number `.00` dropped
fn format_quality(quality: f32) -> String {
    let text = format!("{:.2}", quality);
    match text.strip_suffix(".00") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::VariantRecordBuilder;

    fn line(record: &VariantRecord, samples: usize, full: bool) -> String {
        let mut out = String::new();
        format_record(&mut out, record, samples, full);
        out
    }

    #[test]
    fn test_sites_only_line() {
        let record = VariantRecordBuilder::new("chr1", 100, "A")
            .id("rs1")
            .alt("T")
            .alt("G")
            .quality(50.0)
            .filter("PASS")
            .info("DP", "14")
            .flag("DB")
            .build();
        assert_eq!(
            line(&record, 0, false),
            "chr1\t100\trs1\tA\tT,G\t50\tPASS\tDP=14;DB\n"
        );
    }

    #[test]
    fn test_missing_fields() {
        let record = VariantRecordBuilder::new("chr2", 7, "C").build();
        assert_eq!(line(&record, 0, false), "chr2\t7\t.\tC\t.\t.\t.\t.\n");
    }

    #[test]
    fn test_trailing_missing_values_are_trimmed() {
        let record = VariantRecordBuilder::new("chr1", 5, "A")
            .format(["GT", "DP", "GQ"])
            .genotype([Some("0/1"), None, None])
            .genotype([None::<&str>, None, None])
            .genotype([Some("1/1"), None, Some("99")])
            .build();
        assert_eq!(
            line(&record, 3, false),
            "chr1\t5\t.\tA\t.\t.\t.\t.\tGT:DP:GQ\t0/1\t.\t1/1:.:99\n"
        );
    }

    #[test]
    fn test_full_format_field() {
        let record = VariantRecordBuilder::new("chr1", 5, "A")
            .format(["GT", "DP"])
            .genotype([Some("0/1"), None])
            .build();
        // The second sample has no values at all
        assert_eq!(
            line(&record, 2, true),
            "chr1\t5\t.\tA\t.\t.\t.\t.\tGT:DP\t0/1:.\t.:.\n"
        );
    }

    #[test]
    fn test_quality_formatting() {
        assert_eq!(format_quality(30.0), "30");
        assert_eq!(format_quality(29.5), "29.50");
        assert_eq!(format_quality(0.123), "0.12");
    }
}
