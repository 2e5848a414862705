//! TOML configuration file support.
//!
//! Instead of passing the same flags on every run, settings can live in a file:
//!
//! ```toml
//! # cefmerge.toml
//! [combine]
//! rt_tolerance = 0.05
//! group_similarity_threshold = 0.95
//! exclude_formulas = ["Si", "Cl"]
//!
//! [export]
//! origin = "GC-QTOF screening 2024"
//! library_id = 3
//! ```
//!
//! Flags given on the command line take precedence over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use cefmerge::export::ExportOptions;
use cefmerge::pipeline::CombineConfig;

/// Root configuration structure for cefmerge.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Settings for the combine command.
    #[serde(default)]
    pub combine: CombineSection,

    /// Settings for the export commands.
    #[serde(default)]
    pub export: ExportOptions,
}

/// Configuration for the combine command.
#[derive(Debug, Default, Deserialize)]
pub struct CombineSection {
    /// RT window under which same-name compounds are duplicates.
    pub rt_tolerance: Option<f64>,

    /// Similarity above which adjacent compounds share a group.
    pub group_similarity_threshold: Option<f64>,

    /// Formula substrings to exclude.
    pub exclude_formulas: Option<Vec<String>>,
}

/// Values given explicitly on the command line.
#[derive(Debug, Default)]
pub struct CombineOverrides {
    pub rt_tolerance: Option<f64>,
    pub group_similarity_threshold: Option<f64>,
    pub exclude_formulas: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load the file if one was given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the combine settings: flag, then file, then default.
    pub fn combine_config(&self, overrides: CombineOverrides) -> CombineConfig {
        let defaults = CombineConfig::default();
        CombineConfig {
            rt_tolerance: overrides
                .rt_tolerance
                .or(self.combine.rt_tolerance)
                .unwrap_or(defaults.rt_tolerance),
            group_similarity_threshold: overrides
                .group_similarity_threshold
                .or(self.combine.group_similarity_threshold)
                .unwrap_or(defaults.group_similarity_threshold),
            exclude_formulas: overrides
                .exclude_formulas
                .or_else(|| self.combine.exclude_formulas.clone())
                .unwrap_or(defaults.exclude_formulas),
        }
    }
}
