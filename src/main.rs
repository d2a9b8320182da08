//! # varsink
//!
//! Command-line front end for the varsink writer pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Show which representation a path would produce
//! varsink detect calls.vcf.gz
//!
//! # Write a synthetic indexed callset
//! varsink -v demo calls.vcf.gz --index --md5
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
