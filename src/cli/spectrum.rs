use anyhow::{Context, Result};
use std::path::PathBuf;

use cefmerge::export::nist::write_spectrum_file;
use cefmerge::export::table::read_table_file;

/// Write one table row as a search hand-off file
pub fn run(table: PathBuf, row: usize, output: PathBuf) -> Result<()> {
    let table = read_table_file(&table)
        .with_context(|| format!("Failed to read table: {}", table.display()))?;

    let Some(entry) = table.get(row) else {
        anyhow::bail!("Row {} out of range (table has {} rows)", row, table.len());
    };

    write_spectrum_file(&output, entry)
        .with_context(|| format!("Failed to write spectrum: {}", output.display()))?;

    println!(
        "Wrote spectrum of {:?} (RT {}) to {}",
        entry.display_name(),
        entry.retention_time,
        output.display()
    );
    Ok(())
}
