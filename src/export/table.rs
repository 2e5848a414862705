//! CSV persistence of the combined table.
//!
//! Columns follow [`CompoundTable::COLUMNS`]. Spectra are stored in a single
//! cell as a bracketed list of tuples, e.g. `[(41, 999.0), (43, 120.5)]`.
//! Floats are written with round-trip precision, so a saved table reloads to
//! identical values.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use super::{format_decimal, ExportError};
use crate::compound::{CompoundTable, MergedCompoundEntry, Peak, MAX_NOMINAL_MZ};

/// Render a peak list as `[(mz, intensity), ...]`.
pub fn format_peaks(peaks: &[Peak]) -> String {
    let items: Vec<String> = peaks
        .iter()
        .map(|p| format!("({}, {})", p.mz, format_decimal(p.intensity)))
        .collect();
    format!("[{}]", items.join(", "))
}

/// Parse the `[(mz, intensity), ...]` notation written by [`format_peaks`].
///
/// Masses written as floats are rounded to the nearest integer.
/// Masses above [`MAX_NOMINAL_MZ`] are rejected.
pub fn parse_peaks(text: &str) -> Result<Vec<Peak>, ExportError> {
    let invalid = || ExportError::InvalidPeaks(format!("cannot parse peak list {text:?}"));

    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(invalid)?
        .trim();

    let mut peaks = Vec::new();
    for chunk in inner.split(')') {
        let chunk = chunk.trim().trim_start_matches(',').trim();
        if chunk.is_empty() {
            continue;
        }
        let (mz, intensity) = chunk
            .strip_prefix('(')
            .and_then(|pair| pair.split_once(','))
            .ok_or_else(invalid)?;
        let mz: f64 = mz.trim().parse().map_err(|_| invalid())?;
        let intensity: f64 = intensity.trim().parse().map_err(|_| invalid())?;
        let mz = mz.round_ties_even();
        if !mz.is_finite() || mz < 0.0 || mz > MAX_NOMINAL_MZ as f64 {
            return Err(invalid());
        }
        peaks.push(Peak::new(mz as u32, intensity));
    }
    Ok(peaks)
}

/// Write the table as CSV.
pub fn write_table<W: Write>(writer: W, table: &CompoundTable) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CompoundTable::COLUMNS)?;

    for entry in table {
        csv_writer.write_record([
            entry.chemical_name.clone().unwrap_or_default(),
            entry.formula.clone().unwrap_or_default(),
            format_decimal(entry.retention_time),
            format_decimal(entry.retention_index),
            entry.ri_reference.clone(),
            entry.cas_number.clone().unwrap_or_default(),
            entry.group_id.to_string(),
            format_decimal(entry.similarity_to_previous),
            format_decimal(entry.similarity_to_next),
            format_peaks(&entry.peaks),
            entry.source_file.clone(),
            format_decimal(entry.max_area),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the table to a CSV file.
pub fn write_table_file<P: AsRef<Path>>(path: P, table: &CompoundTable) -> Result<(), ExportError> {
    write_table(File::create(path)?, table)
}

/// Read a table saved by [`write_table`].
///
/// Columns are located by header name and may appear in any order; only
/// `Chemical_Name`, `RT` and `MS_Peaks` are required.
pub fn read_table<R: Read>(reader: R) -> Result<CompoundTable, ExportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: HashMap<String, usize> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();
    for required in ["Chemical_Name", "RT", "MS_Peaks"] {
        if !columns.contains_key(required) {
            return Err(ExportError::MissingColumn(required.to_string()));
        }
    }

    let mut entries = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let cell = |name: &str| {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .unwrap_or("")
        };
        let text = |name: &str| Some(cell(name).to_string()).filter(|s| !s.is_empty());
        let number = |name: &str| -> Result<f64, ExportError> {
            let value = cell(name);
            if value.is_empty() {
                return Ok(0.0);
            }
            value.parse().map_err(|_| {
                ExportError::InvalidPeaks(format!("row {}: invalid {name} value {value:?}", row + 1))
            })
        };

        entries.push(MergedCompoundEntry {
            chemical_name: text("Chemical_Name"),
            formula: text("Formula"),
            cas_number: text("CAS_Number"),
            retention_time: number("RT")?,
            retention_index: number("RI")?,
            ri_reference: cell("RI Ref").to_string(),
            max_area: number("Max_Area")?,
            peaks: parse_peaks(cell("MS_Peaks"))?,
            source_file: cell("File").to_string(),
            similarity_to_previous: number("Similarity_to_Previous")?,
            similarity_to_next: number("Similarity_to_Next")?,
            group_id: number("group")? as u32,
        });
    }
    Ok(CompoundTable::new(entries))
}

/// Read a table from a CSV file.
pub fn read_table_file<P: AsRef<Path>>(path: P) -> Result<CompoundTable, ExportError> {
    read_table(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::CompoundRecord;

    fn table() -> CompoundTable {
        let mut first = MergedCompoundEntry::from(
            CompoundRecord::new(1.25, vec![Peak::new(41, 999.0), Peak::new(43, 120.5)])
                .with_name("Hexane, 2-methyl-")
                .with_formula("C7H16")
                .with_cas_number("591-76-4")
                .with_retention_index(665.1)
                .with_max_area(15000.0)
                .with_source_file("a.cef"),
        );
        first.group_id = 1;
        first.similarity_to_next = 0.123456789012345;
        let mut second = MergedCompoundEntry::from(CompoundRecord::new(2.5, vec![Peak::new(44, 1.0)]));
        second.group_id = 2;
        second.similarity_to_previous = 0.123456789012345;
        second.ri_reference = "NIST".to_string();
        CompoundTable::new(vec![first, second])
    }

    #[test]
    fn test_format_and_parse_peaks() {
        let peaks = vec![Peak::new(41, 999.0), Peak::new(43, 120.5)];
        assert_eq!(format_peaks(&peaks), "[(41, 999.0), (43, 120.5)]");
        assert_eq!(parse_peaks("[(41, 999.0), (43, 120.5)]").unwrap(), peaks);
        assert_eq!(parse_peaks("[(41.4, 999), (43.0,120.5)]").unwrap(), peaks);
        assert!(parse_peaks("[]").unwrap().is_empty());
        assert!(parse_peaks("41 999").is_err());
        assert!(parse_peaks("[(41; 999)]").is_err());
        assert!(parse_peaks("[(4000000000, 1.0)]").is_err());
    }

    #[test]
    fn test_table_reloads_identically() {
        let original = table();
        let mut out = Vec::new();
        write_table(&mut out, &original).unwrap();

        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with(
            "Chemical_Name,Formula,RT,RI,RI Ref,CAS_Number,group,Similarity_to_Previous,Similarity_to_Next,MS_Peaks,File,Max_Area"
        ));
        assert!(text.contains("\"Hexane, 2-methyl-\""));

        let reloaded = read_table(out.as_slice()).unwrap();
        assert_eq!(reloaded, original);
    }

    #[test]
    fn test_missing_column() {
        let csv = "Chemical_Name,RT\nX,1.0\n";
        assert!(matches!(
            read_table(csv.as_bytes()),
            Err(ExportError::MissingColumn(ref c)) if c == "MS_Peaks"
        ));
    }

    #[test]
    fn test_reads_foreign_column_order() {
        let csv = "File,MS_Peaks,RT,Chemical_Name\nb.cef,\"[(50, 2.0)]\",3.5,Y\n";
        let table = read_table(csv.as_bytes()).unwrap();
        let entry = &table.entries()[0];
        assert_eq!(entry.display_name(), "Y");
        assert_eq!(entry.source_file, "b.cef");
        assert_eq!(entry.peaks, vec![Peak::new(50, 2.0)]);
        assert_eq!(entry.group_id, 0);
        assert_eq!(entry.formula, None);
    }
}
