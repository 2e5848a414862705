//! Spectrum hand-off file for an external library search program.
//!
//! The search program imports a small text file holding one spectrum:
//!
//! ```text
//! name:RT - 5.5
//! num:3
//! 91	999
//! 92	72
//! 65	120
//! ```
//!
//! Launching the search program itself is left to the caller.

use std::fs;
use std::path::Path;

use super::{format_decimal, ExportError};
use crate::compound::MergedCompoundEntry;

/// Render the hand-off text for one entry.
pub fn format_spectrum(entry: &MergedCompoundEntry) -> Result<String, ExportError> {
    if entry.peaks.is_empty() {
        return Err(ExportError::EmptySpectrum {
            name: entry.display_name().to_string(),
        });
    }

    let mut text = format!(
        "name:RT - {}\nnum:{}\n",
        format_decimal(entry.retention_time),
        entry.peaks.len()
    );
    for peak in &entry.peaks {
        text.push_str(&format!("{}\t{}\n", peak.mz, peak.intensity.trunc() as i64));
    }
    Ok(text)
}

/// Write the hand-off file for one entry.
pub fn write_spectrum_file<P: AsRef<Path>>(path: P, entry: &MergedCompoundEntry) -> Result<(), ExportError> {
    fs::write(path, format_spectrum(entry)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::{CompoundRecord, Peak};

    #[test]
    fn test_format_spectrum() {
        let entry = MergedCompoundEntry::from(CompoundRecord::new(
            5.5,
            vec![Peak::new(91, 999.7), Peak::new(92, 72.0), Peak::new(65, 120.1)],
        ));
        assert_eq!(
            format_spectrum(&entry).unwrap(),
            "name:RT - 5.5\nnum:3\n91\t999\n92\t72\n65\t120\n"
        );
    }

    #[test]
    fn test_write_spectrum_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datafile.txt");
        let entry = MergedCompoundEntry::from(CompoundRecord::new(2.0, vec![Peak::new(44, 10.0)]));
        write_spectrum_file(&path, &entry).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name:RT - 2.0\nnum:1\n44\t10\n");
    }
}
