use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use cefmerge::export::table::write_table_file;
use cefmerge::pipeline::{combine, combine_files, CombineConfig};

/// Combine CEF files into a CSV table
pub fn run(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    config: &CombineConfig,
    report_path: Option<PathBuf>,
) -> Result<()> {
    for input in &inputs {
        if !input.exists() {
            anyhow::bail!("Input does not exist: {}", input.display());
        }
    }

    info!("cefmerge - combine CEF results");
    info!("==============================");
    info!("Output: {}", output.display());
    info!("RT tolerance: {}", config.rt_tolerance);
    info!("Group similarity threshold: {}", config.group_similarity_threshold);
    info!("Excluded formulas: {:?}", config.exclude_formulas);

    let result = match inputs.as_slice() {
        [dir] if dir.is_dir() => {
            info!("Input directory: {}", dir.display());
            combine(dir, config).context("Combine failed")?
        }
        files => {
            if let Some(dir) = files.iter().find(|p| p.is_dir()) {
                anyhow::bail!(
                    "Directories cannot be mixed with files: {}",
                    dir.display()
                );
            }
            info!("Input files: {}", files.len());
            combine_files(files, config)
        }
    };

    write_table_file(&output, &result.table)
        .with_context(|| format!("Failed to write table: {}", output.display()))?;

    #[cfg(feature = "colorized_output")]
    {
        print!("{}", result.report.format_colored());
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        print!("{}", result.report);
    }

    println!(
        "Wrote {} compounds in {} groups to {}",
        result.table.len(),
        result.table.group_count(),
        output.display()
    );

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&result.report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if result.report.files_read == 0 && result.report.has_skipped() {
        anyhow::bail!("No source file could be read");
    }

    Ok(())
}
