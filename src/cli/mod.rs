use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use varsink::output_type::OutputType;

mod config;
mod demo;
mod detect;

/// varsink - Variant Output Pipelines
#[derive(Parser)]
#[command(name = "varsink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output representation requested on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TypeArg {
    /// Plain-text VCF
    Vcf,
    /// Binary BCF
    Bcf,
    /// BGZF-compressed VCF
    VcfGz,
}

impl From<TypeArg> for OutputType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Vcf => OutputType::TextFile,
            TypeArg::Bcf => OutputType::BinaryFile,
            TypeArg::VcfGz => OutputType::CompressedTextFile,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the output type a path resolves to
    Detect {
        /// Path to inspect (need not exist)
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic sorted callset through the writer builder
    Demo {
        /// Output path; its name selects the format unless --type is given
        #[arg(value_name = "OUTPUT", default_value = "demo_calls.vcf.gz")]
        output: PathBuf,

        /// Override the output type inferred from the path
        #[arg(short = 't', long = "type", value_enum)]
        output_type: Option<TypeArg>,

        /// Write BCF whatever the output type
        #[arg(long)]
        force_binary: bool,

        /// Write an .md5 sidecar next to the output
        #[arg(long)]
        md5: bool,

        /// Serialize on a background thread
        #[arg(long)]
        async_io: bool,

        /// Build an index while writing
        #[arg(long)]
        index: bool,

        /// Buffer size in bytes (0 disables buffering)
        #[arg(short = 'b', long)]
        buffer: Option<usize>,

        /// Number of records to generate
        #[arg(short = 'n', long, default_value = "10000")]
        records: usize,

        /// Load writer settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Detect { path, json } => detect::run(path, json),
        Commands::Demo {
            output,
            output_type,
            force_binary,
            md5,
            async_io,
            index,
            buffer,
            records,
            config,
        } => demo::run(demo::DemoArgs {
            output,
            output_type: output_type.map(OutputType::from),
            force_binary,
            md5,
            async_io,
            index,
            buffer,
            records,
            config,
        }),
    }
}
