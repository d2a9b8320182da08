use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

use varsink::prelude::*;

use super::config::Config;

const SAMPLES: [&str; 2] = ["NA12878", "NA12891"];

/// Arguments of the demo command
pub struct DemoArgs {
    pub output: PathBuf,
    pub output_type: Option<OutputType>,
    pub force_binary: bool,
    pub md5: bool,
    pub async_io: bool,
    pub index: bool,
    pub buffer: Option<usize>,
    pub records: usize,
    pub config: Option<PathBuf>,
}

/// Write a synthetic sorted callset
pub fn run(args: DemoArgs) -> Result<()> {
    info!("varsink demo");
    info!("============");

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let dictionary = demo_dictionary();
    let mut builder = VariantWriterBuilder::new();
    builder
        .unset_option(WriterOption::IndexOnTheFly)
        .set_output_path(&args.output)
        .set_reference_dictionary(dictionary.clone());

    for option in &config.writer.options {
        builder.set_option(*option);
    }
    if let Some(size) = args.buffer.or(config.writer.buffer_size) {
        builder.set_buffer(size);
    }
    if args.md5 {
        builder.set_create_checksum();
    } else if let Some(enabled) = config.writer.create_md5 {
        builder.modify_create_checksum(enabled);
    }
    if args.async_io {
        builder.set_option(WriterOption::UseAsyncIo);
    } else if let Some(enabled) = config.writer.async_io {
        builder.modify_option(WriterOption::UseAsyncIo, enabled);
    }
    if args.index {
        builder.set_option(WriterOption::IndexOnTheFly);
    }
    if args.force_binary {
        builder.set_option(WriterOption::ForceBinary);
    }
    if let Some(output_type) = args.output_type {
        builder
            .set_output_file_type(output_type)
            .context("Invalid output type")?;
    }

    info!("Output: {}", args.output.display());
    info!("Type: {}", builder.output_type());
    info!("Options: {:?}", builder.options());
    info!("Buffer size: {}", builder.buffer_size());

    let started = Instant::now();
    let mut writer = builder.build().context("Failed to create variant writer")?;

    writer
        .write_header(&demo_header(&dictionary))
        .context("Failed to write header")?;

    let records = generate_records(&dictionary, args.records);
    for (i, record) in records.into_iter().enumerate() {
        writer
            .add_owned(record)
            .with_context(|| format!("Failed to write record {}", i + 1))?;

        if (i + 1) % 100_000 == 0 {
            info!("  Written {} records...", i + 1);
        }
    }

    let stats = writer.close().context("Failed to finalize output")?;
    let elapsed = started.elapsed();

    println!("{}", stats);
    info!("Elapsed: {:.2?}", elapsed);

    let file_size = std::fs::metadata(&args.output).map(|m| m.len()).unwrap_or(0);
    info!(
        "Output file size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1024.0 / 1024.0
    );

    Ok(())
}

fn demo_dictionary() -> SequenceDictionary {
    [
        SequenceRecord::new("chr1", Some(248_956_422)),
        SequenceRecord::new("chr2", Some(242_193_529)),
        SequenceRecord::new("chr3", Some(198_295_559)),
    ]
    .into_iter()
    .collect()
}

fn demo_header(dictionary: &SequenceDictionary) -> VcfHeader {
    let mut header = VcfHeader::new().with_samples(SAMPLES);
    header
        .add_line(HeaderLine::Other {
            key: "fileDate".to_string(),
            value: chrono::Local::now().format("%Y%m%d").to_string(),
        })
        .add_line(HeaderLine::Other {
            key: "source".to_string(),
            value: format!("varsink-{}", env!("CARGO_PKG_VERSION")),
        })
        .add_line(HeaderLine::info("DP", "1", "Integer", "Total Depth"))
        .add_line(HeaderLine::info("AF", "A", "Float", "Allele Frequency"))
        .add_line(HeaderLine::info("DB", "0", "Flag", "dbSNP membership"))
        .add_line(HeaderLine::filter("q10", "Quality below 10"))
        .add_line(HeaderLine::format("GT", "1", "String", "Genotype"))
        .add_line(HeaderLine::format("DP", "1", "Integer", "Read Depth"));

    for sequence in dictionary.sequences() {
        header.add_line(HeaderLine::contig(&sequence.name, sequence.length));
    }
    header
}

/// Records spread evenly over the dictionary, sorted by contig then position
fn generate_records(dictionary: &SequenceDictionary, count: usize) -> Vec<VariantRecord> {
    const BASES: [&str; 4] = ["A", "C", "G", "T"];

    let contigs = dictionary.len().max(1);
    let per_contig = count.div_ceil(contigs).max(1);

    (0..count)
        .map(|i| {
            let contig = dictionary
                .get(i / per_contig)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "chr1".to_string());
            let offset = (i % per_contig) as u64;
            let pos = 10_000 + offset * 137 + (offset * 31) % 53;

            let reference = BASES[i % 4];
            let alternate = BASES[(i + 1 + i / 7) % 4];
            let alternate = if alternate == reference { BASES[(i + 2) % 4] } else { alternate };

            let depth = 10 + (i * 17) % 90;
            let quality = 5.0 + ((i * 13) % 600) as f32 / 10.0;

            let mut builder = VariantRecordBuilder::new(contig, pos, reference)
                .alt(alternate)
                .quality(quality)
                .filter(if quality < 10.0 { "q10" } else { "PASS" })
                .info("DP", depth.to_string())
                .info("AF", format!("{:.3}", (i % 100) as f32 / 100.0));
            if i % 11 == 0 {
                builder = builder.id(format!("rs{}", 100_000 + i)).flag("DB");
            }

            builder
                .format(["GT", "DP"])
                .genotype([Some("0/1".to_string()), Some((depth / 2).to_string())])
                .genotype([Some(if i % 3 == 0 { "1/1" } else { "0/0" }.to_string()), None])
                .build()
        })
        .collect()
}
