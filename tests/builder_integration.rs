//! Integration tests for the writer builder
//!
//! These tests build writers against real files and check what lands on disk:
//! the main output, its index and its checksum sidecar.

use flate2::read::MultiGzDecoder;
use md5::{Digest, Md5};
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::tempdir;

use varsink::index::IndexError;
use varsink::prelude::*;
use varsink::writer::BCF_MAGIC;

fn dictionary() -> SequenceDictionary {
    [
        SequenceRecord::new("chr1", Some(100_000)),
        SequenceRecord::new("chr2", Some(50_000)),
    ]
    .into_iter()
    .collect()
}

fn header() -> VcfHeader {
    let mut header = VcfHeader::new().with_samples(["S1"]);
    header
        .add_line(HeaderLine::info("DP", "1", "Integer", "Total Depth"))
        .add_line(HeaderLine::format("GT", "1", "String", "Genotype"))
        .add_line(HeaderLine::contig("chr1", Some(100_000)))
        .add_line(HeaderLine::contig("chr2", Some(50_000)));
    header
}

fn record(contig: &str, pos: u64) -> VariantRecord {
    VariantRecordBuilder::new(contig, pos, "A")
        .alt("T")
        .quality(50.0)
        .filter("PASS")
        .info("DP", "20")
        .format(["GT"])
        .genotype([Some("0/1")])
        .build()
}

fn sorted_records() -> Vec<VariantRecord> {
    let mut records: Vec<_> = (1..=200).map(|i| record("chr1", i * 250)).collect();
    records.extend((1..=50).map(|i| record("chr2", i * 400)));
    records
}

fn write_all(builder: &VariantWriterBuilder) -> Result<WriterStats, WriterError> {
    let mut writer = builder.build()?;
    writer.write_header(&header())?;
    for record in sorted_records() {
        writer.add(&record)?;
    }
    writer.close()
}

fn indexing_builder(path: &Path) -> VariantWriterBuilder {
    let mut builder = VariantWriterBuilder::with_options(OptionSet::of(WriterOption::IndexOnTheFly));
    builder
        .set_output_path(path)
        .set_reference_dictionary(dictionary());
    builder
}

fn decompress(path: &Path) -> String {
    let mut text = String::new();
    MultiGzDecoder::new(fs::File::open(path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    text
}

#[test]
fn test_checksum_sidecar_matches_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");

    let mut builder = VariantWriterBuilder::with_options(OptionSet::empty());
    builder.set_output_path(&path).set_create_checksum();
    let stats = write_all(&builder).unwrap();

    let sidecar = dir.path().join("calls.vcf.md5");
    assert_eq!(stats.checksum_path.as_deref(), Some(sidecar.as_path()));

    let expected = format!("{:x}", Md5::digest(fs::read(&path).unwrap()));
    assert_eq!(fs::read_to_string(&sidecar).unwrap().trim(), expected);
}

#[test]
fn test_checksum_covers_compressed_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf.gz");

    let mut builder = VariantWriterBuilder::with_options(OptionSet::empty());
    builder.set_output_path(&path).set_create_checksum();
    write_all(&builder).unwrap();

    let expected = format!("{:x}", Md5::digest(fs::read(&path).unwrap()));
    let sidecar = dir.path().join("calls.vcf.gz.md5");
    assert_eq!(fs::read_to_string(sidecar).unwrap().trim(), expected);
}

#[test]
fn test_force_binary_keeps_declared_type() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");

    let mut builder = VariantWriterBuilder::with_options(OptionSet::of(WriterOption::ForceBinary));
    builder.set_output_path(&path);
    write_all(&builder).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..BCF_MAGIC.len()], BCF_MAGIC);
    assert_eq!(builder.output_type(), OutputType::TextFile);
    assert_eq!(OutputType::resolve(&path), OutputType::TextFile);
}

#[test]
fn test_index_without_dictionary_is_configuration_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");

    let mut builder = VariantWriterBuilder::with_options(OptionSet::of(WriterOption::IndexOnTheFly));
    builder.set_output_path(&path);

    let err = builder.build().err().expect("missing dictionary must fail");
    assert!(err.is_configuration(), "unexpected error: {}", err);
    assert!(!path.exists());
}

#[test]
fn test_linear_index_for_text_and_binary() {
    let dir = tempdir().unwrap();

    for name in ["calls.vcf", "calls.bcf"] {
        let path = dir.path().join(name);
        let stats = write_all(&indexing_builder(&path)).unwrap();

        let index = dir.path().join(format!("{}.idx", name));
        assert_eq!(stats.index_path.as_deref(), Some(index.as_path()));
        assert!(fs::metadata(&index).unwrap().len() > 0);
        assert_eq!(stats.records_written, 250);
    }
}

#[test]
fn test_tabix_index_for_compressed_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf.gz");

    let stats = write_all(&indexing_builder(&path)).unwrap();

    let index = dir.path().join("calls.vcf.gz.tbi");
    assert_eq!(stats.index_path.as_deref(), Some(index.as_path()));

    let mut magic = [0u8; 4];
    MultiGzDecoder::new(fs::File::open(&index).unwrap())
        .read_exact(&mut magic)
        .unwrap();
    assert_eq!(&magic, b"TBI\x01");
}

#[test]
fn test_tabix_without_dictionary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf.gz");

    let mut builder = VariantWriterBuilder::with_options(OptionSet::of(WriterOption::IndexOnTheFly));
    builder.set_output_path(&path);
    let stats = write_all(&builder).unwrap();

    assert!(stats.index_path.is_some());
}

#[test]
fn test_explicit_index_creator_wins() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf.gz");

    let mut builder = indexing_builder(&path);
    builder.set_index_creator(LinearIndexCreator::new());
    let stats = write_all(&builder).unwrap();

    let index = dir.path().join("calls.vcf.gz.idx");
    assert_eq!(stats.index_path.as_deref(), Some(index.as_path()));
    assert!(!dir.path().join("calls.vcf.gz.tbi").exists());
}

#[test]
fn test_unsorted_records_fail_when_indexing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");

    let mut writer = indexing_builder(&path).build().unwrap();
    writer.write_header(&header()).unwrap();
    writer.add(&record("chr1", 5_000)).unwrap();

    let err = writer.add(&record("chr1", 1_000)).unwrap_err();
    assert!(
        matches!(err, WriterError::Index(IndexError::Unsorted(_))),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_unknown_contig_fails_when_indexing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");

    let mut writer = indexing_builder(&path).build().unwrap();
    writer.write_header(&header()).unwrap();
    assert!(writer.add(&record("chrUn", 10)).is_err());
}

#[test]
fn test_reference_past_coordinate_space_is_rejected_when_indexing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");

    let mut writer = indexing_builder(&path).build().unwrap();
    writer.write_header(&header()).unwrap();
    let overflowing = VariantRecordBuilder::new("chr1", u64::MAX, "AC").build();

    let err = writer.add(&overflowing).unwrap_err();
    assert!(
        matches!(err, WriterError::InvalidRecord(_)),
        "unexpected error: {}",
        err
    );
    writer.add(&record("chr1", 100)).unwrap();
    writer.close().unwrap();
}

#[test]
fn test_tabix_rejects_positions_beyond_binning_range() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf.gz");

    let mut writer = indexing_builder(&path).build().unwrap();
    writer.write_header(&header()).unwrap();
    writer.add(&record("chr1", 100)).unwrap();

    let err = writer.add(&record("chr1", (1 << 30) + 1)).unwrap_err();
    assert!(
        matches!(err, WriterError::Index(IndexError::PositionOutOfRange { .. })),
        "unexpected error: {}",
        err
    );
    writer.add(&record("chr1", 200)).unwrap();
    let stats = writer.close().unwrap();
    assert_eq!(stats.records_written, 2);
}

#[test]
fn test_unwritable_sidecar_fails_build() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");
    fs::create_dir(dir.path().join("calls.vcf.md5")).unwrap();

    let mut builder = VariantWriterBuilder::with_options(OptionSet::empty());
    builder.set_output_path(&path).set_create_checksum();

    let err = builder.build().err().expect("sidecar creation must fail");
    assert!(matches!(err, WriterError::Io { .. }), "unexpected error: {}", err);
}

#[test]
fn test_buffering_and_async_do_not_change_output() {
    let dir = tempdir().unwrap();

    let buffered = dir.path().join("buffered.vcf");
    let mut builder = VariantWriterBuilder::with_options(OptionSet::empty());
    builder.set_output_path(&buffered).set_buffer(4096);
    write_all(&builder).unwrap();

    let unbuffered = dir.path().join("unbuffered.vcf");
    builder.set_output_path(&unbuffered).unset_buffering();
    write_all(&builder).unwrap();

    let background = dir.path().join("async.vcf");
    builder
        .set_output_path(&background)
        .set_buffer(64)
        .set_option(WriterOption::UseAsyncIo);
    write_all(&builder).unwrap();

    let expected = fs::read(&buffered).unwrap();
    assert_eq!(fs::read(&unbuffered).unwrap(), expected);
    assert_eq!(fs::read(&background).unwrap(), expected);
}

#[test]
fn test_compressed_output_decompresses_to_text() {
    let dir = tempdir().unwrap();

    let plain = dir.path().join("calls.vcf");
    let compressed = dir.path().join("calls.vcf.gz");

    let mut builder = VariantWriterBuilder::with_options(OptionSet::empty());
    builder.set_output_path(&plain);
    write_all(&builder).unwrap();
    builder.set_output_path(&compressed);
    write_all(&builder).unwrap();

    let text = fs::read_to_string(&plain).unwrap();
    assert!(text.starts_with("##fileformat=VCFv4.2\n"));
    assert_eq!(decompress(&compressed), text);
}

#[test]
fn test_file_type_override() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.out");

    let mut builder = VariantWriterBuilder::with_options(OptionSet::empty());
    builder.set_output_path(&path);
    assert_eq!(builder.output_type(), OutputType::Unspecified);

    builder
        .set_output_file_type(OutputType::CompressedTextFile)
        .unwrap();
    write_all(&builder).unwrap();

    assert!(decompress(&path).contains("chr2\t20000\t"));
}

#[cfg(unix)]
#[test]
fn test_device_output_skips_index() {
    let path = Path::new("/dev/null");
    assert_eq!(OutputType::resolve(path), OutputType::TextStream);

    let stats = write_all(&indexing_builder(path)).unwrap();
    assert_eq!(stats.index_path, None);
    assert_eq!(stats.records_written, 250);
}
