//! # Merge engine
//!
//! Collapses compounds seen in several runs into one entry per chemical
//! identity and retention window.
//!
//! 1. Records are stable-sorted by `(name, RT)`.
//! 2. A single pass compares each record with the record sorted immediately
//!    before it. Equal names and an RT gap below the tolerance make it a
//!    duplicate: the current entry takes over its spectrum, area, RT, RI and
//!    source file when the duplicate has a strictly larger area. Anything
//!    else starts a new entry.
//! 3. Entries still sharing a name get `" peak 2"`, `" peak 3"`, ... appended,
//!    numbered in the order of step 2.
//! 4. Entries are stable-sorted by RT.
//!
//! Duplicate detection looks at sorted neighbours only, not at the entry being
//! accumulated. In a chain `A(1.00) B(1.08) C(1.16)` with tolerance 0.1 all
//! three merge, although A and C are 0.16 apart; this is a linear scan, not
//! transitive clustering.
//!
//! Generated names are not checked against source names: a record literally
//! named `"X peak 2"` can end up next to a renamed `"X"` with the same name.

use std::collections::HashMap;

use log::debug;

use crate::compound::{CompoundRecord, MergedCompoundEntry};

/// Default RT window under which same-name records are duplicates
pub const DEFAULT_RT_TOLERANCE: f64 = 0.1;

/// Default formula substrings removed from the table
pub const DEFAULT_EXCLUDE_FORMULAS: [&str; 1] = ["Si"];

/// Merge records from all source files into RT-ordered, uniquely named entries.
pub fn merge_records(mut records: Vec<CompoundRecord>, rt_tolerance: f64) -> Vec<MergedCompoundEntry> {
    records.sort_by(|a, b| {
        a.sort_name()
            .cmp(b.sort_name())
            .then(a.retention_time.total_cmp(&b.retention_time))
    });

    let total = records.len();
    let mut entries = deduplicate(&records, rt_tolerance);
    debug!(
        "Merged {} records into {} entries (rt_tolerance = {})",
        total,
        entries.len(),
        rt_tolerance
    );

    rename_residual_duplicates(&mut entries);
    entries.sort_by(|a, b| a.retention_time.total_cmp(&b.retention_time));
    entries
}

/// Whether `current` duplicates the record sorted just before it.
fn is_duplicate(previous: &CompoundRecord, current: &CompoundRecord, rt_tolerance: f64) -> bool {
    previous.chemical_name == current.chemical_name
        && (current.retention_time - previous.retention_time).abs() < rt_tolerance
}

fn deduplicate(sorted: &[CompoundRecord], rt_tolerance: f64) -> Vec<MergedCompoundEntry> {
    let mut entries: Vec<MergedCompoundEntry> = Vec::with_capacity(sorted.len());

    for (i, current) in sorted.iter().enumerate() {
        let duplicate = i > 0 && is_duplicate(&sorted[i - 1], current, rt_tolerance);
        if duplicate {
            if let Some(entry) = entries.last_mut() {
                if current.max_area > entry.max_area {
                    entry.absorb(current);
                }
            }
            continue;
        }
        entries.push(MergedCompoundEntry::from(current.clone()));
    }
    entries
}

/// Append `" peak N"` to every repeat of a name, in the current entry order.
///
/// Unidentified entries are left unnamed.
fn rename_residual_duplicates(entries: &mut [MergedCompoundEntry]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries.iter_mut() {
        let Some(name) = entry.chemical_name.as_mut() else {
            continue;
        };
        let count = counts.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            name.push_str(&format!(" peak {count}"));
        }
    }
}

/// Drop entries whose formula contains any of the given substrings.
///
/// Entries without a formula are kept.
pub fn exclude_formulas<S: AsRef<str>>(
    entries: Vec<MergedCompoundEntry>,
    exclusions: &[S],
) -> Vec<MergedCompoundEntry> {
    entries
        .into_iter()
        .filter(|entry| match entry.formula.as_deref() {
            Some(formula) => !exclusions
                .iter()
                .any(|token| !token.as_ref().is_empty() && formula.contains(token.as_ref())),
            None => true,
        })
        .collect()
}
