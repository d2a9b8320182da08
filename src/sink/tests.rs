use super::*;
use std::fs::OpenOptions;
use std::io::Read;
use std::sync::{Arc, Mutex};

use flate2::read::MultiGzDecoder;
use md5::{Digest, Md5};
use tempfile::tempdir;

use crate::output_type::OutputType;

/// In-memory stream whose contents stay readable after the sink is closed
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn bytes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn create_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.create(true).truncate(true).write(true);
    options
}

fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    MultiGzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

#[test]
fn test_stream_sink_counts_and_flushes() {
    let captured = Captured::default();
    let mut sink = StreamSink::new(SharedStream::new(captured.clone()));

    sink.write_all(b"##fileformat=VCFv4.2\n").unwrap();
    assert_eq!(sink.position(), 21);

    sink.close().unwrap();
    sink.close().unwrap();
    assert!(sink.write(b"x").is_err());
    assert_eq!(captured.bytes(), b"##fileformat=VCFv4.2\n");
}

#[test]
fn test_buffered_position_includes_pending_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.vcf");
    let file = FileSink::open(&path, &create_options()).unwrap();
    let mut sink = BufferedSink::new(Box::new(file), 1024);

    sink.write_all(b"0123456789").unwrap();
    assert_eq!(sink.position(), 10);
    // Nothing reached the file yet
    assert_eq!(std::fs::read(&path).unwrap().len(), 0);

    sink.close().unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"0123456789");
}

#[test]
fn test_checksum_sidecar_matches_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");
    let file = FileSink::open(&path, &create_options()).unwrap();
    let mut sink = ChecksumSink::create(Box::new(file), &path).map_err(|(e, _)| e).unwrap();

    assert!(sink.sidecar_path().exists());
    sink.write_all(b"chr1\t100\t.\tA\tT\t.\t.\t.\n").unwrap();
    sink.close().unwrap();

    let content = std::fs::read(&path).unwrap();
    let expected = format!("{:x}", Md5::digest(&content));
    let sidecar = std::fs::read_to_string(checksum_path(&path)).unwrap();
    assert_eq!(sidecar, expected);
}

#[test]
fn test_checksum_path_appends_suffix() {
    assert_eq!(
        checksum_path(std::path::Path::new("/data/calls.vcf.gz")),
        std::path::PathBuf::from("/data/calls.vcf.gz.md5")
    );
}

#[test]
fn test_bgzf_roundtrip_and_eof_marker() {
    let captured = Captured::default();
    let mut sink = BgzfSink::new(Box::new(StreamSink::new(SharedStream::new(captured.clone()))));

    let line = b"chr1\t12345\trs1\tA\tG\t50\tPASS\tDP=10\n";
    let mut expected = Vec::new();
    for _ in 0..5000 {
        sink.write_all(line).unwrap();
        expected.extend_from_slice(line);
    }
    sink.close().unwrap();

    let bytes = captured.bytes();
    assert!(bytes.ends_with(&BGZF_EOF_MARKER));
    assert_eq!(&bytes[12..14], b"BC");
    assert_eq!(gunzip(&bytes), expected);
}

#[test]
fn test_bgzf_virtual_offsets() {
    let captured = Captured::default();
    let mut sink = BgzfSink::new(Box::new(StreamSink::new(SharedStream::new(captured.clone()))));

    assert_eq!(sink.position(), 0);
    sink.write_all(b"abc").unwrap();
    assert_eq!(sink.position(), 3);

    // Flushing completes the block; the next block starts after it
    sink.flush().unwrap();
    let first_block_len = captured.bytes().len() as u64;
    assert_eq!(sink.position(), first_block_len << 16);

    sink.write_all(b"de").unwrap();
    assert_eq!(sink.position(), (first_block_len << 16) | 2);
    sink.close().unwrap();
}

#[test]
fn test_bgzf_splits_large_writes_into_blocks() {
    let captured = Captured::default();
    let mut sink = BgzfSink::new(Box::new(StreamSink::new(SharedStream::new(captured.clone()))));

    let data = vec![b'N'; MAX_BLOCK_SIZE * 2 + 10];
    sink.write_all(&data).unwrap();
    assert_eq!(sink.position() & 0xffff, 10);
    sink.close().unwrap();

    assert_eq!(gunzip(&captured.bytes()), data);
}

#[test]
fn test_plan_for_compressed_file_with_checksum() {
    let target = Target::Path("out.vcf.gz".into());
    let pipeline = Pipeline::plan(
        &target,
        OutputType::CompressedTextFile,
        OutputType::CompressedTextFile,
        4096,
        true,
    );
    assert_eq!(
        pipeline.layers(),
        &[
            Layer::Buffer(4096),
            Layer::Checksum("out.vcf.gz.md5".into()),
            Layer::BlockCompression,
        ]
    );
}

#[test]
fn test_plan_for_stream_skips_file_layers() {
    let target = Target::Stream(SharedStream::new(io::sink()));
    let pipeline = Pipeline::plan(
        &target,
        OutputType::TextStream,
        OutputType::TextStream,
        4096,
        true,
    );
    assert!(pipeline.layers().is_empty());
    assert!(pipeline.checksum_path().is_none());
}

#[test]
fn test_plan_without_buffer() {
    let target = Target::Path("out.bcf".into());
    let pipeline = Pipeline::plan(&target, OutputType::BinaryFile, OutputType::BinaryFile, 0, false);
    assert!(pipeline.layers().is_empty());
}

#[test]
fn test_plan_skips_checksum_for_special_file() {
    let target = Target::Path("/dev/stdout".into());
    let pipeline = Pipeline::plan(&target, OutputType::TextStream, OutputType::TextStream, 16, true);
    assert_eq!(pipeline.layers(), &[Layer::Buffer(16)]);
}

#[test]
fn test_open_assembles_working_sink() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf.gz");
    let target = Target::Path(path.clone());
    let pipeline = Pipeline::plan(
        &target,
        OutputType::CompressedTextFile,
        OutputType::CompressedTextFile,
        128,
        true,
    );

    let mut sink = pipeline.open(&target, &create_options()).unwrap();
    sink.write_all(b"hello bgzf\n").unwrap();
    sink.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(gunzip(&bytes), b"hello bgzf\n");
    let sidecar = std::fs::read_to_string(checksum_path(&path)).unwrap();
    assert_eq!(sidecar, format!("{:x}", Md5::digest(&bytes)));
}

#[test]
fn test_open_fails_when_sidecar_is_unwritable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.vcf");
    // A directory where the sidecar file should go
    std::fs::create_dir(checksum_path(&path)).unwrap();

    let target = Target::Path(path.clone());
    let pipeline = Pipeline::plan(&target, OutputType::TextFile, OutputType::TextFile, 0, true);
    let err = match pipeline.open(&target, &create_options()) {
        Ok(_) => panic!("expected sidecar creation to fail"),
        Err(e) => e,
    };
    assert!(matches!(err, crate::writer::WriterError::Io { .. }));
}

#[test]
fn test_open_missing_directory_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("calls.vcf");
    let target = Target::Path(path.clone());
    let pipeline = Pipeline::plan(&target, OutputType::TextFile, OutputType::TextFile, 0, false);

    match pipeline.open(&target, &create_options()) {
        Err(crate::writer::WriterError::Io { path: reported, .. }) => assert_eq!(reported, path),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected open to fail"),
    }
}
