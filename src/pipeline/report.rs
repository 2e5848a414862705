use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;
use serde::Serialize;

/// A file or compound left out of the combined table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    /// File name
    pub file: String,
    /// Compound position within the file, `None` when the whole file was skipped
    pub record: Option<usize>,
    /// Why it was skipped
    pub reason: String,
}

impl SkippedSource {
    pub(crate) fn new(file: &str, record: Option<usize>, reason: String) -> Self {
        Self {
            file: file.to_string(),
            record,
            reason,
        }
    }
}

/// Summary of a combine run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CombineReport {
    /// Source files read successfully
    pub files_read: usize,
    /// Compounds parsed from those files
    pub records_parsed: usize,
    /// Compounds merged into another entry as duplicates
    pub duplicates_merged: usize,
    /// Entries removed by formula exclusion
    pub excluded: usize,
    /// Unreadable files and malformed compounds
    pub skipped: Vec<SkippedSource>,
}

impl CombineReport {
    /// Number of whole files that could not be read
    pub fn skipped_files(&self) -> usize {
        self.skipped.iter().filter(|s| s.record.is_none()).count()
    }

    /// Number of individual compounds skipped
    pub fn skipped_records(&self) -> usize {
        self.skipped.iter().filter(|s| s.record.is_some()).count()
    }

    /// Whether anything was skipped
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            let mut output = String::new();
            output.push_str(&format!("{}\n", style("Combine Summary").bold().cyan()));
            output.push_str(&format!("{}\n", style("===============").cyan()));
            output.push_str(&format!("Files read:        {}\n", style(self.files_read).green()));
            output.push_str(&format!("Records parsed:    {}\n", self.records_parsed));
            output.push_str(&format!("Duplicates merged: {}\n", self.duplicates_merged));
            output.push_str(&format!("Excluded:          {}\n", self.excluded));

            if self.has_skipped() {
                output.push_str(&format!(
                    "{}: {} files, {} compounds\n",
                    style("Skipped").yellow().bold(),
                    style(self.skipped_files()).red(),
                    style(self.skipped_records()).yellow()
                ));
                for skipped in &self.skipped {
                    output.push_str(&format!("  {} {}\n", style("-").yellow(), skipped));
                }
            }
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for SkippedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record {
            Some(index) => write!(f, "{} (compound #{}): {}", self.file, index, self.reason),
            None => write!(f, "{}: {}", self.file, self.reason),
        }
    }
}

impl fmt::Display for CombineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Combine Summary")?;
        writeln!(f, "===============")?;
        writeln!(f, "Files read:        {}", self.files_read)?;
        writeln!(f, "Records parsed:    {}", self.records_parsed)?;
        writeln!(f, "Duplicates merged: {}", self.duplicates_merged)?;
        writeln!(f, "Excluded:          {}", self.excluded)?;
        if self.has_skipped() {
            writeln!(
                f,
                "Skipped: {} files, {} compounds",
                self.skipped_files(),
                self.skipped_records()
            )?;
            for skipped in &self.skipped {
                writeln!(f, "  - {}", skipped)?;
            }
        }
        Ok(())
    }
}
