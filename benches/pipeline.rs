use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io;
use tempfile::TempDir;
use varsink::prelude::*;

/// Generate a sorted single-sample callset on chr1
fn generate_records(count: usize) -> Vec<VariantRecord> {
    (0..count)
        .map(|i| {
            VariantRecordBuilder::new("chr1", 1_000 + i as u64 * 100, "A")
                .alt("G")
                .quality(30.0 + (i % 40) as f32)
                .filter("PASS")
                .info("DP", (10 + i % 50).to_string())
                .format(["GT", "DP"])
                .genotype([Some("0/1"), Some("12")])
                .build()
        })
        .collect()
}

fn header() -> VcfHeader {
    let mut header = VcfHeader::new().with_samples(["S1"]);
    header
        .add_line(HeaderLine::info("DP", "1", "Integer", "Total Depth"))
        .add_line(HeaderLine::format("GT", "1", "String", "Genotype"))
        .add_line(HeaderLine::format("DP", "1", "Integer", "Read Depth"))
        .add_line(HeaderLine::contig("chr1", Some(248_956_422)));
    header
}

fn write(builder: &VariantWriterBuilder, records: &[VariantRecord]) -> WriterStats {
    let mut writer = builder.build().expect("Failed to build writer");
    writer.write_header(&header()).expect("Failed to write header");
    for record in records {
        writer.add(record).expect("Failed to write record");
    }
    writer.close().expect("Failed to close writer")
}

/// Benchmark file outputs by representation
fn bench_file_outputs(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_output");
    let dictionary: SequenceDictionary = [SequenceRecord::new("chr1", Some(248_956_422))]
        .into_iter()
        .collect();

    for num_records in [1_000, 10_000] {
        let records = generate_records(num_records);
        group.throughput(Throughput::Elements(num_records as u64));

        for (name, file_name, options) in [
            ("text", "bench.vcf", OptionSet::empty()),
            ("compressed", "bench.vcf.gz", OptionSet::empty()),
            ("binary", "bench.bcf", OptionSet::empty()),
            ("compressed_indexed", "bench.vcf.gz", OptionSet::of(WriterOption::IndexOnTheFly)),
            ("text_async", "bench.vcf", OptionSet::of(WriterOption::UseAsyncIo)),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, num_records),
                &records,
                |b, records| {
                    b.iter_batched(
                        || {
                            let temp_dir = TempDir::new().unwrap();
                            let mut builder = VariantWriterBuilder::with_options(options);
                            builder
                                .set_output_path(temp_dir.path().join(file_name))
                                .set_reference_dictionary(dictionary.clone());
                            (temp_dir, builder)
                        },
                        |(temp_dir, builder)| {
                            let _stats = write(&builder, records);
                            drop(temp_dir);
                        },
                        criterion::BatchSize::LargeInput,
                    );
                },
            );
        }
    }

    group.finish();
}

/// Benchmark serialization cost alone, against a discarding stream
fn bench_stream_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_output");
    let records = generate_records(10_000);
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("text_sink", |b| {
        b.iter(|| {
            let mut builder = VariantWriterBuilder::with_options(OptionSet::empty());
            builder.set_output_text_stream(io::sink());
            write(&builder, &records)
        });
    });

    group.bench_function("binary_sink", |b| {
        b.iter(|| {
            let mut builder = VariantWriterBuilder::with_options(OptionSet::empty());
            builder.set_output_binary_stream(io::sink());
            write(&builder, &records)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_file_outputs, bench_stream_output);
criterion_main!(benches);
