//! # Pipeline orchestrator
//!
//! Drives a batch from source files to the final table:
//!
//! ```text
//! directory ──► read_cef_file (per file) ──► merge_records ──► exclude_formulas ──► group_entries
//! ```
//!
//! Unreadable files and malformed compounds are skipped and listed in the
//! [`CombineReport`]; one bad file never aborts the batch.

mod report;

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cef::{read_cef_file, CefError, CefFile, CEF_EXTENSION};
use crate::compound::{CompoundRecord, CompoundTable};
use crate::grouping::{group_entries, DEFAULT_GROUP_SIMILARITY_THRESHOLD};
use crate::merge::{exclude_formulas, merge_records, DEFAULT_EXCLUDE_FORMULAS, DEFAULT_RT_TOLERANCE};

pub use report::{CombineReport, SkippedSource};

/// Errors that abort a combine run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The source directory could not be listed
    #[error("Cannot read source directory {path}: {source}")]
    Directory {
        /// Directory that was requested
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Parameters of a combine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    /// RT window (exclusive) under which same-name compounds are duplicates
    pub rt_tolerance: f64,
    /// Similarity above which adjacent entries share a group
    pub group_similarity_threshold: f64,
    /// Formula substrings whose compounds are dropped
    pub exclude_formulas: Vec<String>,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            rt_tolerance: DEFAULT_RT_TOLERANCE,
            group_similarity_threshold: DEFAULT_GROUP_SIMILARITY_THRESHOLD,
            exclude_formulas: DEFAULT_EXCLUDE_FORMULAS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CombineConfig {
    /// Set the duplicate RT tolerance
    pub fn with_rt_tolerance(mut self, rt_tolerance: f64) -> Self {
        self.rt_tolerance = rt_tolerance;
        self
    }

    /// Set the grouping similarity threshold
    pub fn with_group_similarity_threshold(mut self, threshold: f64) -> Self {
        self.group_similarity_threshold = threshold;
        self
    }

    /// Replace the formula exclusion tokens
    pub fn with_exclude_formulas<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_formulas = tokens.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of a combine run
#[derive(Debug, Clone)]
pub struct CombineOutput {
    /// The RT-ordered, grouped table
    pub table: CompoundTable,
    /// What was read, merged, excluded and skipped
    pub report: CombineReport,
}

/// Combine every CEF file in `directory` (non-recursive).
pub fn combine<P: AsRef<Path>>(directory: P, config: &CombineConfig) -> Result<CombineOutput, PipelineError> {
    let files = list_cef_files(directory.as_ref())?;
    info!(
        "Found {} CEF files in {}",
        files.len(),
        directory.as_ref().display()
    );
    Ok(combine_files(&files, config))
}

/// Combine an explicit list of CEF files, in the given order.
pub fn combine_files<P: AsRef<Path> + Sync>(paths: &[P], config: &CombineConfig) -> CombineOutput {
    #[cfg(feature = "parallel")]
    let parsed: Vec<Result<CefFile, CefError>> =
        paths.par_iter().map(|p| read_cef_file(p.as_ref())).collect();
    #[cfg(not(feature = "parallel"))]
    let parsed: Vec<Result<CefFile, CefError>> =
        paths.iter().map(|p| read_cef_file(p.as_ref())).collect();

    let mut report = CombineReport::default();
    let mut records = Vec::new();
    for (path, result) in paths.iter().zip(parsed) {
        let file_name = display_name(path.as_ref());
        match result {
            Ok(file) => {
                report.files_read += 1;
                for error in file.malformed {
                    let record = match &error {
                        CefError::MalformedRecord { index, .. } => Some(*index),
                        _ => None,
                    };
                    report.skipped.push(SkippedSource::new(&file_name, record, error.to_string()));
                }
                records.extend(file.records);
            }
            Err(error) => {
                warn!("Skipping {}: {}", file_name, error);
                report.skipped.push(SkippedSource::new(&file_name, None, error.to_string()));
            }
        }
    }

    let (table, stats) = combine_records(records, config);
    report.records_parsed = stats.records_parsed;
    report.duplicates_merged = stats.duplicates_merged;
    report.excluded = stats.excluded;

    info!(
        "Combined {} records from {} files into {} compounds in {} groups ({} skipped)",
        report.records_parsed,
        report.files_read,
        table.len(),
        table.group_count(),
        report.skipped.len()
    );

    CombineOutput { table, report }
}

/// Counters produced by [`combine_records`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineStats {
    /// Records fed into the merge
    pub records_parsed: usize,
    /// Records absorbed into another entry
    pub duplicates_merged: usize,
    /// Entries removed by formula exclusion
    pub excluded: usize,
}

/// Merge, filter and group already parsed records.
pub fn combine_records(records: Vec<CompoundRecord>, config: &CombineConfig) -> (CompoundTable, CombineStats) {
    let records_parsed = records.len();
    let merged = merge_records(records, config.rt_tolerance);
    let duplicates_merged = records_parsed - merged.len();

    let before = merged.len();
    let kept = exclude_formulas(merged, &config.exclude_formulas);
    let excluded = before - kept.len();

    let table = group_entries(kept, config.group_similarity_threshold);
    (
        table,
        CombineStats {
            records_parsed,
            duplicates_merged,
            excluded,
        },
    )
}

/// CEF files directly inside `directory`, sorted by file name.
pub fn list_cef_files(directory: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let to_error = |source| PipelineError::Directory {
        path: directory.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(to_error)? {
        let path = entry.map_err(to_error)?.path();
        if path.is_file() && is_cef_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_cef_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CEF_EXTENSION))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
