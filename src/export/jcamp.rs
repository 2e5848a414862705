//! JCAMP-DX style peak-table library.
//!
//! Each compound becomes one labelled record followed by `m/z intensity`
//! pairs and an `##END=` marker; records are separated by a blank line.
//! Intensities are truncated toward zero, never rounded.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{format_decimal, ExportError, ExportOptions};
use crate::compound::{max_mz, MergedCompoundEntry};

/// Render one entry as a peak-table record (without the trailing blank line).
pub fn format_record(entry: &MergedCompoundEntry, options: &ExportOptions) -> Result<String, ExportError> {
    let last_x = max_mz(&entry.peaks).ok_or_else(|| ExportError::EmptySpectrum {
        name: entry.display_name().to_string(),
    })?;

    let mut text = String::new();
    let mut field = |label: &str, value: &dyn std::fmt::Display| {
        let _ = writeln!(text, "##{label}={value}");
    };
    field("TITLE", &entry.display_name());
    field("JCAMPDX", &"Revision 5.00");
    field("DATA TYPE", &"MASS SPECTRUM");
    field("ORIGIN", &options.origin);
    field("OWNER", &"");
    field("CAS REGISTRY NO", &entry.cas_number.as_deref().unwrap_or(""));
    field("$RETENTION INDEX", &format_decimal(entry.retention_index));
    field("RETENTION TIME", &format_decimal(entry.retention_time));
    field("MOLECULAR FORMULA", &entry.formula.as_deref().unwrap_or(""));
    field("XUNITS", &"M/Z");
    field("YUNITS", &"RELATIVE INTENSITY");
    field("XFACTOR", &1);
    field("YFACTOR", &1);
    field("FIRSTX", &0);
    field("LASTX", &last_x);
    field("FIRSTY", &0);
    field("MAXX", &last_x);
    field("MINX", &0);
    field("MAXY", &999);
    field("MINY", &0);
    field("MW", &format_decimal(entry.retention_time));
    field("NPOINTS", &entry.peaks.len());
    field("PEAK TABLE", &"(XY..XY)");

    for peak in &entry.peaks {
        let _ = writeln!(text, "{} {}", peak.mz, peak.intensity.trunc() as i64);
    }
    text.push_str("##END=");
    Ok(text)
}

/// Write all entries as a peak-table library.
pub fn write_library<'a, W, I>(mut writer: W, entries: I, options: &ExportOptions) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a MergedCompoundEntry>,
{
    let mut count = 0;
    for entry in entries {
        let record = format_record(entry, options)?;
        writer.write_all(record.as_bytes())?;
        writer.write_all(b"\n\n")?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Write all entries to a peak-table file.
pub fn write_library_file<'a, P, I>(path: P, entries: I, options: &ExportOptions) -> Result<usize, ExportError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a MergedCompoundEntry>,
{
    let file = File::create(path)?;
    write_library(BufWriter::new(file), entries, options)
}

/// Title and peaks of one record read back from a peak-table file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakTableRecord {
    /// `##TITLE=` value
    pub title: String,
    /// `(m/z, intensity)` pairs from the peak section
    pub peaks: Vec<(u32, i64)>,
}

/// Read the titles and peak sections of a peak-table library.
pub fn read_peak_tables(text: &str) -> Result<Vec<PeakTableRecord>, ExportError> {
    let mut records = Vec::new();
    let mut title: Option<String> = None;
    let mut peaks: Option<Vec<(u32, i64)>> = None;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(label) = line.strip_prefix("##") {
            let (key, value) = label.split_once('=').unwrap_or((label, ""));
            match key {
                "TITLE" => {
                    title = Some(value.to_string());
                    peaks = None;
                }
                "PEAK TABLE" => peaks = Some(Vec::new()),
                "END" => {
                    let record = PeakTableRecord {
                        title: title.take().ok_or_else(|| {
                            ExportError::InvalidPeakTable(format!("line {}: END without TITLE", line_no + 1))
                        })?,
                        peaks: peaks.take().unwrap_or_default(),
                    };
                    records.push(record);
                }
                _ => {}
            }
            continue;
        }

        let Some(section) = peaks.as_mut() else {
            return Err(ExportError::InvalidPeakTable(format!(
                "line {}: data outside a peak table",
                line_no + 1
            )));
        };
        let mut fields = line.split_whitespace();
        let parsed = match (fields.next(), fields.next(), fields.next()) {
            (Some(mz), Some(intensity), None) => mz.parse::<u32>().ok().zip(intensity.parse::<i64>().ok()),
            _ => None,
        };
        match parsed {
            Some(pair) => section.push(pair),
            None => {
                return Err(ExportError::InvalidPeakTable(format!(
                    "line {}: expected `<m/z> <intensity>`, got {:?}",
                    line_no + 1,
                    line
                )))
            }
        }
    }

    if title.is_some() {
        return Err(ExportError::InvalidPeakTable("last record has no END".to_string()));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::{CompoundRecord, Peak};

    fn entry() -> MergedCompoundEntry {
        let record = CompoundRecord::new(5.5, vec![Peak::new(91, 999.9), Peak::new(65, 120.2), Peak::new(92, 72.0)])
            .with_name("Toluene")
            .with_formula("C7H8")
            .with_cas_number("108-88-3")
            .with_retention_index(1042.3);
        MergedCompoundEntry::from(record)
    }

    #[test]
    fn test_format_record() {
        let text = format_record(&entry(), &ExportOptions::default()).unwrap();
        let expected = "\
##TITLE=Toluene
##JCAMPDX=Revision 5.00
##DATA TYPE=MASS SPECTRUM
##ORIGIN=Combined CEF Results
##OWNER=
##CAS REGISTRY NO=108-88-3
##$RETENTION INDEX=1042.3
##RETENTION TIME=5.5
##MOLECULAR FORMULA=C7H8
##XUNITS=M/Z
##YUNITS=RELATIVE INTENSITY
##XFACTOR=1
##YFACTOR=1
##FIRSTX=0
##LASTX=92
##FIRSTY=0
##MAXX=92
##MINX=0
##MAXY=999
##MINY=0
##MW=5.5
##NPOINTS=3
##PEAK TABLE=(XY..XY)
91 999
65 120
92 72
##END=";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_spectrum_rejected() {
        let mut empty = entry();
        empty.peaks.clear();
        assert!(matches!(
            format_record(&empty, &ExportOptions::default()),
            Err(ExportError::EmptySpectrum { .. })
        ));
    }

    #[test]
    fn test_records_are_separated_by_blank_line() {
        let entries = vec![entry(), entry()];
        let mut out = Vec::new();
        let count = write_library(&mut out, &entries, &ExportOptions::default()).unwrap();
        assert_eq!(count, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("##END=\n\n##TITLE=").count(), 1);
        assert!(text.ends_with("##END=\n\n"));
    }

    #[test]
    fn test_read_back_peaks() {
        let entries = vec![entry()];
        let mut out = Vec::new();
        write_library(&mut out, &entries, &ExportOptions::default()).unwrap();

        let records = read_peak_tables(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Toluene");
        assert_eq!(records[0].peaks, vec![(91, 999), (65, 120), (92, 72)]);
    }

    #[test]
    fn test_read_rejects_garbage() {
        assert!(read_peak_tables("12 34\n").is_err());
        assert!(read_peak_tables("##TITLE=x\n##PEAK TABLE=(XY..XY)\n12 abc\n##END=\n").is_err());
        assert!(read_peak_tables("##TITLE=x\n##PEAK TABLE=(XY..XY)\n12 3\n").is_err());
    }
}
