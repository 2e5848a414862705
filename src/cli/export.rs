use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use std::path::PathBuf;

use cefmerge::export::table::read_table_file;
use cefmerge::export::{jcamp, mslibrary, ExportOptions};

/// Export a saved table as a peak-table library
pub fn run_jcamp(table: PathBuf, output: PathBuf, options: &ExportOptions) -> Result<()> {
    let table = read_table_file(&table)
        .with_context(|| format!("Failed to read table: {}", table.display()))?;

    let count = jcamp::write_library_file(&output, &table, options)
        .with_context(|| format!("Failed to write library: {}", output.display()))?;

    info!("Wrote {} records to {}", count, output.display());
    println!("Exported {} compounds to {}", count, output.display());
    Ok(())
}

/// Export a saved table as an XML spectral library
pub fn run_library(table: PathBuf, output: PathBuf, options: &ExportOptions) -> Result<()> {
    let table = read_table_file(&table)
        .with_context(|| format!("Failed to read table: {}", table.display()))?;

    let created = Local::now().fixed_offset();
    let count = mslibrary::write_library_file(&output, &table, options, &created)
        .with_context(|| format!("Failed to write library: {}", output.display()))?;

    info!("Library timestamp: {}", mslibrary::format_timestamp(&created));
    println!("Exported {} compounds to {}", count, output.display());
    Ok(())
}
