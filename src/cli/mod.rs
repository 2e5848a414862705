use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod combine;
mod config;
mod export;
mod spectrum;

pub use config::{CombineOverrides, Config};

/// cefmerge - Combine CEF compound results into spectral libraries
#[derive(Parser)]
#[command(name = "cefmerge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge and group the compounds of CEF files into one table
    Combine {
        /// A directory of .cef files, or individual .cef files
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output CSV table
        #[arg(short, long, value_name = "OUTPUT", default_value = "combined.csv")]
        output: PathBuf,

        /// RT window under which same-name compounds are duplicates (default: 0.1)
        #[arg(long)]
        rt_tolerance: Option<f64>,

        /// Similarity above which adjacent compounds share a group (default: 0.9)
        #[arg(long)]
        threshold: Option<f64>,

        /// Exclude compounds whose formula contains this text (repeatable, default: Si)
        #[arg(long = "exclude", value_name = "TEXT")]
        exclude: Vec<String>,

        /// Do not exclude any formulas
        #[arg(long, conflicts_with = "exclude")]
        no_exclude: bool,

        /// Also write the run summary as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Export a combined table as a JCAMP-DX peak-table library
    ExportJcamp {
        /// Combined CSV table
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        /// Output library file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Export a combined table as an XML spectral library
    ExportLibrary {
        /// Combined CSV table
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        /// Output XML file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Write one row's spectrum as a search hand-off file
    Spectrum {
        /// Combined CSV table
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        /// Zero-based table row
        #[arg(short, long)]
        row: usize,

        /// Output spectrum file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
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
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Combine {
            inputs,
            output,
            rt_tolerance,
            threshold,
            exclude,
            no_exclude,
            report,
        } => {
            let exclude_formulas = if no_exclude {
                Some(Vec::new())
            } else if exclude.is_empty() {
                None
            } else {
                Some(exclude)
            };
            let combine_config = config.combine_config(CombineOverrides {
                rt_tolerance,
                group_similarity_threshold: threshold,
                exclude_formulas,
            });
            combine::run(inputs, output, &combine_config, report)
        }
        Commands::ExportJcamp { table, output } => export::run_jcamp(table, output, &config.export),
        Commands::ExportLibrary { table, output } => {
            export::run_library(table, output, &config.export)
        }
        Commands::Spectrum { table, row, output } => spectrum::run(table, row, output),
    }
}
