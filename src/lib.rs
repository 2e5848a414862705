//! # cefmerge - Consolidate CEF compound results into spectral libraries
//!
//! `cefmerge` reads the Compound Exchange Format (CEF) files written by vendor
//! deconvolution software, merges the compounds found across runs, groups
//! near-identical neighbouring spectra and exports the result as spectral
//! libraries for downstream MS search tools.
//!
//! ## Pipeline
//!
//! 1. **Read**: every `*.cef` file in a directory is parsed into
//!    [`CompoundRecord`](compound::CompoundRecord)s. Malformed compounds and
//!    unreadable files are skipped and reported, never silently dropped.
//! 2. **Merge**: records sharing a name within an RT tolerance collapse into
//!    one entry keeping the strongest (largest area) observation; remaining
//!    same-name entries become `"<name> peak N"`.
//! 3. **Exclude**: entries whose formula contains an excluded token (by
//!    default `"Si"`, column bleed) are removed.
//! 4. **Group**: neighbours in RT order are compared by cosine similarity and
//!    split into contiguous groups.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cefmerge::pipeline::{combine, CombineConfig};
//! use cefmerge::export::{jcamp, ExportOptions};
//!
//! let config = CombineConfig::default().with_rt_tolerance(0.05);
//! let output = combine("results/", &config)?;
//!
//! println!("{}", output.report);
//! for entry in &output.table {
//!     println!("{:>8.3} {:<40} group {}", entry.retention_time, entry.display_name(), entry.group_id);
//! }
//!
//! jcamp::write_library_file("library.jdx", &output.table, &ExportOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`cef`]: streaming CEF reader
//! - [`compound`]: records, merged entries and the final table
//! - [`similarity`]: nominal-mass cosine similarity
//! - [`merge`]: deduplication, renaming and formula exclusion
//! - [`grouping`]: neighbour similarity and group assignment
//! - [`pipeline`]: directory-level orchestration and reporting
//! - [`export`]: peak-table, XML library, search hand-off and CSV writers

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod cef;
pub mod compound;
pub mod export;
pub mod grouping;
pub mod merge;
pub mod pipeline;
pub mod similarity;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::cef::{read_cef_file, CefError, CefFile, CefReader};
    pub use crate::compound::{CompoundRecord, CompoundTable, MergedCompoundEntry, Peak};
    pub use crate::export::{ExportError, ExportOptions};
    pub use crate::grouping::{group_entries, DEFAULT_GROUP_SIMILARITY_THRESHOLD};
    pub use crate::merge::{exclude_formulas, merge_records, DEFAULT_RT_TOLERANCE};
    pub use crate::pipeline::{
        combine, combine_files, combine_records, CombineConfig, CombineOutput, CombineReport,
        PipelineError, SkippedSource,
    };
    pub use crate::similarity::similarity;
}
