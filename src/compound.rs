//! # Compound data model
//!
//! Types shared by every stage of the pipeline:
//!
//! - [`Peak`]: one nominal-mass peak of a spectrum
//! - [`CompoundRecord`]: one detected compound read from one CEF file
//! - [`MergedCompoundEntry`]: a deduplicated compound with similarity and group annotations
//! - [`CompoundTable`]: the final RT-ordered table handed to exporters and the CLI

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest nominal m/z accepted from any source.
///
/// Similarity lays spectra out as dense vectors up to their largest mass, so
/// this bounds the memory of a single comparison.
pub const MAX_NOMINAL_MZ: u32 = 100_000;

/// A single centroided peak.
///
/// The mass-to-charge value is rounded to the nearest integer when the
/// source file is read, so spectra from different runs share the same axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Nominal mass-to-charge value
    pub mz: u32,
    /// Peak intensity (abundance)
    pub intensity: f64,
}

impl Peak {
    /// Create a new peak
    pub fn new(mz: u32, intensity: f64) -> Self {
        Self { mz, intensity }
    }
}

impl From<(u32, f64)> for Peak {
    fn from((mz, intensity): (u32, f64)) -> Self {
        Self { mz, intensity }
    }
}

/// Largest nominal mass in a peak list, if any.
pub fn max_mz(peaks: &[Peak]) -> Option<u32> {
    peaks.iter().map(|p| p.mz).max()
}

/// One detected compound from one source file.
///
/// Records are immutable once parsed; the merge stage converts the surviving
/// ones into [`MergedCompoundEntry`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundRecord {
    /// Identified chemical name, absent when the compound was not identified
    pub chemical_name: Option<String>,
    /// Molecular formula
    pub formula: Option<String>,
    /// CAS registry number
    pub cas_number: Option<String>,
    /// Retention time (minutes)
    pub retention_time: f64,
    /// Retention index, 0 when the source does not report one
    pub retention_index: f64,
    /// Peak area, 0 when the source does not report one
    pub max_area: f64,
    /// Spectrum in document order (not necessarily sorted by mass)
    pub peaks: Vec<Peak>,
    /// Base name of the file the record was read from
    pub source_file: String,
}

impl CompoundRecord {
    /// Create a record with only a retention time and a spectrum.
    pub fn new(retention_time: f64, peaks: Vec<Peak>) -> Self {
        Self {
            chemical_name: None,
            formula: None,
            cas_number: None,
            retention_time,
            retention_index: 0.0,
            max_area: 0.0,
            peaks,
            source_file: String::new(),
        }
    }

    /// Set the chemical name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.chemical_name = Some(name.into());
        self
    }

    /// Set the molecular formula
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Set the CAS registry number
    pub fn with_cas_number(mut self, cas: impl Into<String>) -> Self {
        self.cas_number = Some(cas.into());
        self
    }

    /// Set the retention index
    pub fn with_retention_index(mut self, ri: f64) -> Self {
        self.retention_index = ri;
        self
    }

    /// Set the peak area
    pub fn with_max_area(mut self, area: f64) -> Self {
        self.max_area = area;
        self
    }

    /// Set the source file name
    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = file.into();
        self
    }

    /// Name used for ordering; unidentified compounds sort as the empty string.
    pub fn sort_name(&self) -> &str {
        self.chemical_name.as_deref().unwrap_or("")
    }
}

/// A deduplicated compound, annotated with its neighbours' spectral similarity
/// and a group identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCompoundEntry {
    /// Chemical name, possibly suffixed with `" peak N"` to disambiguate
    pub chemical_name: Option<String>,
    /// Molecular formula
    pub formula: Option<String>,
    /// CAS registry number
    pub cas_number: Option<String>,
    /// Retention time of the winning duplicate
    pub retention_time: f64,
    /// Retention index of the winning duplicate
    pub retention_index: f64,
    /// Free-text retention index reference, empty until annotated by a user
    pub ri_reference: String,
    /// Largest peak area seen among the merged duplicates
    pub max_area: f64,
    /// Spectrum of the winning duplicate
    pub peaks: Vec<Peak>,
    /// Source file of the winning duplicate
    pub source_file: String,
    /// Cosine similarity to the previous entry in RT order (0 for the first entry)
    pub similarity_to_previous: f64,
    /// Cosine similarity to the next entry in RT order (0 for the last entry)
    pub similarity_to_next: f64,
    /// Contiguous similarity group, starting at 1 (0 before grouping)
    pub group_id: u32,
}

impl MergedCompoundEntry {
    /// Replace the spectrum-bearing fields with those of a stronger duplicate.
    ///
    /// Name, formula and CAS number stay those of the entry.
    pub fn absorb(&mut self, duplicate: &CompoundRecord) {
        self.max_area = duplicate.max_area;
        self.peaks = duplicate.peaks.clone();
        self.source_file = duplicate.source_file.clone();
        self.retention_time = duplicate.retention_time;
        self.retention_index = duplicate.retention_index;
    }

    /// Display name, empty for unidentified compounds.
    pub fn display_name(&self) -> &str {
        self.chemical_name.as_deref().unwrap_or("")
    }
}

impl From<CompoundRecord> for MergedCompoundEntry {
    fn from(record: CompoundRecord) -> Self {
        Self {
            chemical_name: record.chemical_name,
            formula: record.formula,
            cas_number: record.cas_number,
            retention_time: record.retention_time,
            retention_index: record.retention_index,
            ri_reference: String::new(),
            max_area: record.max_area,
            peaks: record.peaks,
            source_file: record.source_file,
            similarity_to_previous: 0.0,
            similarity_to_next: 0.0,
            group_id: 0,
        }
    }
}

/// The combined, RT-ordered compound table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundTable {
    entries: Vec<MergedCompoundEntry>,
}

impl CompoundTable {
    /// Column headers, in presentation order.
    pub const COLUMNS: [&'static str; 12] = [
        "Chemical_Name",
        "Formula",
        "RT",
        "RI",
        "RI Ref",
        "CAS_Number",
        "group",
        "Similarity_to_Previous",
        "Similarity_to_Next",
        "MS_Peaks",
        "File",
        "Max_Area",
    ];

    /// Wrap already ordered and annotated entries.
    pub fn new(entries: Vec<MergedCompoundEntry>) -> Self {
        Self { entries }
    }

    /// Entries in table order
    pub fn entries(&self) -> &[MergedCompoundEntry] {
        &self.entries
    }

    /// Row by index
    pub fn get(&self, row: usize) -> Option<&MergedCompoundEntry> {
        self.entries.get(row)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over rows
    pub fn iter(&self) -> std::slice::Iter<'_, MergedCompoundEntry> {
        self.entries.iter()
    }

    /// Number of distinct groups
    pub fn group_count(&self) -> usize {
        self.entries.last().map(|e| e.group_id as usize).unwrap_or(0)
    }

    /// Consume the table and return its rows
    pub fn into_entries(self) -> Vec<MergedCompoundEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a CompoundTable {
    type Item = &'a MergedCompoundEntry;
    type IntoIter = std::slice::Iter<'a, MergedCompoundEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.mz, self.intensity)
    }
}
