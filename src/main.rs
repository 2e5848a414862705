//! # cefmerge
//!
//! Command-line front end for combining CEF results and exporting libraries.
//!
//! ## Usage
//!
//! ```bash
//! # Merge every .cef file of a batch into one table
//! cefmerge combine results/ -o combined.csv
//!
//! # Export the table for library search tools
//! cefmerge export-jcamp combined.csv library.jdx
//! cefmerge export-library combined.csv library.xml
//!
//! # Hand one spectrum to an external search program
//! cefmerge spectrum combined.csv --row 12 datafile.txt
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
