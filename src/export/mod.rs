//! # Library export
//!
//! Writers for the formats downstream MS search tools import:
//!
//! - [`jcamp`]: JCAMP-DX style peak tables, one record per compound
//! - [`mslibrary`]: XML spectral library with base64-encoded binary arrays
//! - [`nist`]: single-spectrum hand-off file for an external library search
//! - [`table`]: CSV persistence of the combined table
//!
//! All writers take the table rows in order and never reorder them.

pub mod binary;
pub mod jcamp;
pub mod mslibrary;
pub mod nist;
pub mod table;

use serde::Deserialize;

/// Errors that can occur while exporting or reloading a table
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// I/O error writing or reading a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error writing XML
    #[error("XML writing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// An entry has no peaks to export
    #[error("Compound {name:?} has an empty spectrum")]
    EmptySpectrum {
        /// Display name of the entry
        name: String,
    },

    /// A peak list or table cell could not be parsed
    #[error("Invalid peak data: {0}")]
    InvalidPeaks(String),

    /// A table is missing a required column
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A peak-table record is not well formed
    #[error("Invalid peak table: {0}")]
    InvalidPeakTable(String),
}

/// Default `ORIGIN` / `Origin` value
pub const DEFAULT_ORIGIN: &str = "Combined CEF Results";

/// Settings shared by the library writers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Origin written into every record
    pub origin: String,
    /// Library identifier of the XML library
    pub library_id: u32,
    /// Ion polarity written for every spectrum
    pub ion_polarity: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            library_id: 1,
            ion_polarity: "Positive".to_string(),
        }
    }
}

/// Format a float the way the library consumers expect: shortest
/// round-trip digits, always with a fractional part (`5.0`, `1042.3`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(0.0), "0.0");
        assert_eq!(format_decimal(5.0), "5.0");
        assert_eq!(format_decimal(1042.3), "1042.3");
        assert_eq!(format_decimal(5.123), "5.123");
        assert_eq!(format_decimal(-2.0), "-2.0");
    }

    #[test]
    fn test_export_options_from_toml() {
        let options: ExportOptions = toml::from_str("library_id = 7").unwrap();
        assert_eq!(options.library_id, 7);
        assert_eq!(options.origin, DEFAULT_ORIGIN);
        assert_eq!(options.ion_polarity, "Positive");
    }
}
